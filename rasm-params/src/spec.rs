//! Parameter specs - range, step, inversion and unit for one engine quantity

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Slack used when deciding how many whole steps fit into a range
pub(crate) const GRID_TOLERANCE: f64 = 1e-9;

/// Maximum number of decimals used when formatting values
const MAX_DECIMALS: usize = 4;

/// Errors raised while constructing a parameter spec
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("parameter {id}: bounds must be finite (min={min}, max={max})")]
    NonFiniteBound { id: ParameterId, min: f64, max: f64 },
    #[error("parameter {id}: min ({min}) must be less than max ({max})")]
    EmptyRange { id: ParameterId, min: f64, max: f64 },
    #[error("parameter {id}: step must be finite")]
    NonFiniteStep { id: ParameterId },
    #[error("parameter {id}: step ({step}) must not be negative")]
    NegativeStep { id: ParameterId, step: f64 },
}

/// Stable identifier of an engine parameter
///
/// Configurations address parameters either by name or by numeric index;
/// numeric ids are kept as their decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawParameterId")]
pub struct ParameterId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParameterId {
    Text(String),
    Index(u64),
}

impl From<RawParameterId> for ParameterId {
    fn from(raw: RawParameterId) -> Self {
        match raw {
            RawParameterId::Text(s) => Self(s),
            RawParameterId::Index(i) => Self(i.to_string()),
        }
    }
}

impl ParameterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for ParameterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParameterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParameterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u32> for ParameterId {
    fn from(index: u32) -> Self {
        Self(index.to_string())
    }
}

/// Metadata for one controllable engine quantity
///
/// Immutable once built. `step == 0.0` means continuous; a positive step
/// restricts legal values to `min + k * step` inside `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    id: ParameterId,
    min: f64,
    max: f64,
    step: f64,
    inverted: bool,
    unit: String,
    label: Option<String>,
}

impl ParameterSpec {
    /// Create a continuous, non-inverted spec
    pub fn new(id: impl Into<ParameterId>, min: f64, max: f64) -> Result<Self, SpecError> {
        let id = id.into();
        if !min.is_finite() || !max.is_finite() {
            return Err(SpecError::NonFiniteBound { id, min, max });
        }
        if min >= max {
            return Err(SpecError::EmptyRange { id, min, max });
        }
        Ok(Self {
            id,
            min,
            max,
            step: 0.0,
            inverted: false,
            unit: String::new(),
            label: None,
        })
    }

    /// Set the quantization step (0 = continuous)
    pub fn with_step(mut self, step: f64) -> Result<Self, SpecError> {
        if !step.is_finite() {
            return Err(SpecError::NonFiniteStep { id: self.id });
        }
        if step < 0.0 {
            return Err(SpecError::NegativeStep { id: self.id, step });
        }
        self.step = step;
        Ok(self)
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> &ParameterId {
        &self.id
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Display name, falling back to the id
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn is_stepped(&self) -> bool {
        self.step > 0.0
    }

    /// Number of whole steps between min and max (None when continuous)
    ///
    /// `sensitivity` spanning 20..80 in steps of 5 has 12 steps.
    pub fn step_count(&self) -> Option<u32> {
        if !self.is_stepped() {
            return None;
        }
        let steps = ((self.max - self.min) / self.step + GRID_TOLERANCE).floor();
        Some(steps as u32)
    }

    /// Format an engine value with as many decimals as the step needs
    pub fn format_value(&self, value: f64) -> String {
        let decimals = self.decimals();
        if self.unit.is_empty() {
            format!("{:.*}", decimals, value)
        } else {
            format!("{:.*} {}", decimals, value, self.unit)
        }
    }

    fn decimals(&self) -> usize {
        if !self.is_stepped() {
            return 2;
        }
        (0..=MAX_DECIMALS)
            .find(|&d| {
                let scaled = self.step * 10f64.powi(d as i32);
                (scaled - scaled.round()).abs() < 1e-6
            })
            .unwrap_or(MAX_DECIMALS)
    }
}
