//! Parameter value space for rasm - specs, registry, transforms and ticks
//!
//! Everything in this crate is pure and synchronous:
//! - Spec: range, step, inversion and unit of one engine parameter
//! - Registry: read-only table of specs shared by all bindings
//! - Transform: display position <-> engine value mapping
//! - Ticks: evenly spaced marks for stepped controls

mod registry;
mod spec;
mod ticks;
mod transform;

pub use registry::{ParameterRegistry, RegistryError};
pub use spec::{ParameterId, ParameterSpec, SpecError};
pub use ticks::{ticks, Ticks};
pub use transform::{DisplayScale, ValueTransform, DEFAULT_DISPLAY_SCALE};
