//! Device - in-process parameter host for an exported patch
//!
//! Owns the parameter values, constrains every write to the parameter's
//! range and step count, and fires change notifications to subscribers.

use parking_lot::Mutex;
use rasm_params::ParameterId;
use rasm_sync::{ChangeListener, EngineParameter, ParameterChange, ParameterSource, Subscription};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by device parameter access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("parameter index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("parameter '{id}': refusing non-finite value {value}")]
    NonFiniteValue { id: ParameterId, value: f64 },
}

/// Static description of one device parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub id: ParameterId,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub initial: f64,
    /// 0 = continuous, n > 1 = n evenly spaced normalized positions
    pub steps: u32,
    pub unit: String,
}

impl ParameterInfo {
    /// Continuous parameter whose id and name are the same
    pub fn new(name: &str, min: f64, max: f64, initial: f64) -> Self {
        Self {
            id: name.into(),
            name: name.to_string(),
            min,
            max,
            initial,
            steps: 0,
            unit: String::new(),
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    /// Clamp to range, then snap to the step count
    pub fn constrain(&self, value: f64) -> f64 {
        let value = value.clamp(self.min, self.max);
        let span = self.max - self.min;
        if self.steps == 0 || span <= 0.0 {
            return value;
        }
        let mut normalized = (value - self.min) / span;
        if self.steps == 1 {
            if normalized > 0.0 {
                normalized = 1.0;
            }
        } else {
            let one_step = 1.0 / (self.steps - 1) as f64;
            normalized = (normalized / one_step).round() * one_step;
        }
        self.min + normalized * span
    }
}

/// Name and parameter table of a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
}

impl DeviceDescriptor {
    /// Parameter table of the `rasm_origin` patch export
    pub fn rasm_origin() -> Self {
        Self {
            name: "rasm_origin".to_string(),
            parameters: vec![
                ParameterInfo::new("volume", 0.0, 1.0, 0.0),
                ParameterInfo::new("sensitivity", 20.0, 80.0, 40.0),
                ParameterInfo::new("responsiveness", 0.0, 10.0, 5.0),
                ParameterInfo::new("dynamics", 0.0, 4.0, 2.0),
                ParameterInfo::new("release", 0.0, 10.0, 5.0),
            ],
        }
    }
}

struct DeviceState {
    values: Vec<f64>,
    listeners: Vec<(u64, ChangeListener)>,
    next_token: u64,
}

struct DeviceInner {
    descriptor: DeviceDescriptor,
    state: Mutex<DeviceState>,
}

impl DeviceInner {
    fn info(&self, index: usize) -> Result<&ParameterInfo, DeviceError> {
        self.descriptor
            .parameters
            .get(index)
            .ok_or(DeviceError::IndexOutOfRange(index))
    }

    fn set_value(&self, index: usize, value: f64) -> Result<f64, DeviceError> {
        let info = self.info(index)?;
        if !value.is_finite() {
            return Err(DeviceError::NonFiniteValue {
                id: info.id.clone(),
                value,
            });
        }
        let value = info.constrain(value);

        let listeners: Vec<ChangeListener> = {
            let mut state = self.state.lock();
            if state.values[index] == value {
                return Ok(value);
            }
            state.values[index] = value;
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };

        // Notify outside the lock; listeners may read or write back
        let change = ParameterChange {
            id: info.id.clone(),
            value,
        };
        for listener in listeners {
            listener(&change);
        }
        Ok(value)
    }
}

/// Handle to a running device
///
/// Cheap to clone; all clones share the same parameter state.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        let values = descriptor
            .parameters
            .iter()
            .map(|p| p.constrain(p.initial))
            .collect();
        debug!(
            device = %descriptor.name,
            parameters = descriptor.parameters.len(),
            "device created"
        );
        Self {
            inner: Arc::new(DeviceInner {
                descriptor,
                state: Mutex::new(DeviceState {
                    values,
                    listeners: Vec::new(),
                    next_token: 0,
                }),
            }),
        }
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.inner.descriptor
    }

    pub fn parameter_count(&self) -> usize {
        self.inner.descriptor.parameters.len()
    }

    /// Index of a parameter, matching by name first and then by id
    pub fn index_of(&self, key: &str) -> Option<usize> {
        let parameters = &self.inner.descriptor.parameters;
        parameters
            .iter()
            .position(|p| p.name == key)
            .or_else(|| parameters.iter().position(|p| p.id.as_str() == key))
    }

    pub fn value(&self, index: usize) -> Result<f64, DeviceError> {
        self.inner.info(index)?;
        Ok(self.inner.state.lock().values[index])
    }

    /// Write a parameter; returns the constrained value actually stored
    pub fn set_value(&self, index: usize, value: f64) -> Result<f64, DeviceError> {
        self.inner.set_value(index, value)
    }

    pub fn set_by_key(&self, key: &str, value: f64) -> Result<f64, DeviceError> {
        let index = self
            .index_of(key)
            .ok_or_else(|| DeviceError::UnknownParameter(key.to_string()))?;
        self.set_value(index, value)
    }

    /// Put every parameter back to its initial value
    pub fn reset(&self) {
        for (index, info) in self.inner.descriptor.parameters.iter().enumerate() {
            if let Err(e) = self.set_value(index, info.initial) {
                warn!(parameter = %info.id, error = %e, "reset failed");
            }
        }
        debug!(device = %self.inner.descriptor.name, "device reset");
    }

    /// Register for changes to any parameter
    pub fn subscribe_all(&self, listener: ChangeListener) -> Subscription {
        let token = {
            let mut state = self.inner.state.lock();
            let token = state.next_token;
            state.next_token += 1;
            state.listeners.push((token, listener));
            token
        };
        let inner: Weak<DeviceInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.state.lock().listeners.retain(|(t, _)| *t != token);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Handle for one parameter
    pub fn parameter_handle(&self, index: usize) -> Result<DeviceParameter, DeviceError> {
        self.inner.info(index)?;
        Ok(DeviceParameter {
            device: self.clone(),
            index,
        })
    }
}

impl ParameterSource for Device {
    fn parameters(&self) -> Vec<Arc<dyn EngineParameter>> {
        (0..self.parameter_count())
            .map(|index| {
                Arc::new(DeviceParameter {
                    device: self.clone(),
                    index,
                }) as Arc<dyn EngineParameter>
            })
            .collect()
    }
}

/// One parameter of a [`Device`]
#[derive(Clone)]
pub struct DeviceParameter {
    device: Device,
    index: usize,
}

impl DeviceParameter {
    fn info(&self) -> &ParameterInfo {
        &self.device.inner.descriptor.parameters[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl EngineParameter for DeviceParameter {
    fn id(&self) -> &ParameterId {
        &self.info().id
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    fn get(&self) -> f64 {
        self.device.inner.state.lock().values[self.index]
    }

    fn set(&self, value: f64) {
        if let Err(e) = self.device.set_value(self.index, value) {
            warn!(error = %e, "parameter write rejected");
        }
    }

    /// Filters the device-wide change stream down to this parameter
    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let id = self.info().id.clone();
        self.device.subscribe_all(Arc::new(move |change: &ParameterChange| {
            if change.id == id {
                listener(change);
            }
        }))
    }
}
