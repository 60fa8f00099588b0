//! Reference engine for rasm
//!
//! - Device: parameter host with range/step constraint and change events
//! - Input: default input device capture with an RMS level meter

mod device;
mod input;

pub use device::{Device, DeviceDescriptor, DeviceError, DeviceParameter, ParameterInfo};
pub use input::{meter_level, rms, AcquireError, InputSource, LEVEL_GAIN};
