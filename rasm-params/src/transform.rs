//! Value transform - maps between a control's display position and an engine value
//!
//! Engine -> display: normalize, clamp to [0, 1], invert if needed, scale.
//! Display -> engine: recover the normalized position, undo inversion,
//! denormalize, snap to the step grid (round-half-up), clamp to [min, max].

use crate::spec::{ParameterSpec, GRID_TOLERANCE};

/// Default width of a normalized display (sliders run 0..100)
pub const DEFAULT_DISPLAY_SCALE: f64 = 100.0;

/// Domain a control presents to the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayScale {
    /// Fixed `[0, scale]` range regardless of the parameter's units
    Normalized(f64),
    /// The parameter's own `[min, max]` range
    Native,
}

impl Default for DisplayScale {
    fn default() -> Self {
        DisplayScale::Normalized(DEFAULT_DISPLAY_SCALE)
    }
}

impl DisplayScale {
    /// Normalized scales must be finite and positive
    pub fn is_valid(&self) -> bool {
        match *self {
            DisplayScale::Normalized(scale) => scale.is_finite() && scale > 0.0,
            DisplayScale::Native => true,
        }
    }
}

/// Pure bidirectional mapping for one parameter spec
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueTransform {
    min: f64,
    max: f64,
    step: f64,
    inverted: bool,
    /// Display range low end
    lo: f64,
    /// Display range high end
    hi: f64,
}

impl ValueTransform {
    pub fn new(spec: &ParameterSpec, display: DisplayScale) -> Self {
        let (lo, hi) = match display {
            DisplayScale::Normalized(scale) => (0.0, scale),
            DisplayScale::Native => (spec.min(), spec.max()),
        };
        Self {
            min: spec.min(),
            max: spec.max(),
            step: spec.step(),
            inverted: spec.is_inverted(),
            lo,
            hi,
        }
    }

    /// Range the control must present, as `(low, high)`
    pub fn display_range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Step the control should snap to, in display units
    ///
    /// Zero for continuous specs. Also zero when the display grid would
    /// not line up with the engine grid: an inverted display anchors at
    /// `max`, so its grid only matches when the step divides the range.
    pub fn display_step(&self) -> f64 {
        if self.step <= 0.0 {
            return 0.0;
        }
        let span = self.max - self.min;
        let steps = (span / self.step + GRID_TOLERANCE).floor();
        let divides = (steps * self.step - span).abs() <= GRID_TOLERANCE * span.max(1.0);
        if self.inverted && !divides {
            return 0.0;
        }
        self.step * (self.hi - self.lo) / span
    }

    /// Engine value -> display position
    pub fn to_display(&self, engine_value: f64) -> f64 {
        let value = if engine_value.is_finite() { engine_value } else { self.min };
        let mut norm = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if self.inverted {
            norm = 1.0 - norm;
        }
        self.lo + norm * (self.hi - self.lo)
    }

    /// Display position -> legal engine value
    pub fn to_engine(&self, position: f64) -> f64 {
        let position = if position.is_finite() { position } else { self.lo };
        let width = self.hi - self.lo;
        let mut norm = if width > 0.0 {
            ((position - self.lo) / width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.inverted {
            norm = 1.0 - norm;
        }
        let raw = self.min + norm * (self.max - self.min);
        self.quantize(raw).clamp(self.min, self.max)
    }

    /// Snap a raw engine value onto the `min + k * step` grid
    ///
    /// Rounds half up. When the step does not divide the range, values
    /// past the last grid point land on the largest grid point below `max`.
    pub fn quantize(&self, raw: f64) -> f64 {
        if self.step <= 0.0 {
            return raw;
        }
        let k_max = ((self.max - self.min) / self.step + GRID_TOLERANCE).floor();
        let k = ((raw - self.min) / self.step + 0.5).floor().clamp(0.0, k_max);
        self.min + k * self.step
    }

    /// Read-path clamp for values reported by the engine
    pub fn clamp_engine(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.min
        }
    }

    /// Clamp a display position into the display range
    pub fn clamp_display(&self, position: f64) -> f64 {
        if position.is_finite() {
            position.clamp(self.lo, self.hi)
        } else {
            self.lo
        }
    }
}
