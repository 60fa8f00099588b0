//! Control/parameter synchronization for rasm
//!
//! Binds UI controls to engine parameters and keeps both sides consistent:
//! - Handles: capability traits for engine parameters and controls
//! - Binding: per-pair state machine with anti-feedback and epsilon gating
//! - Manager: builds one binding per mapping entry and tears them down

mod binding;
mod error;
mod handles;
mod manager;
mod poller;

pub use binding::{BindingOptions, BindingStats, ControlBinding, SyncMode, SyncPhase};
pub use error::BindingError;
pub use handles::{
    ChangeListener, ControlHandle, ControlSurface, EngineParameter, InputListener, ParameterChange,
    ParameterSource, Subscription,
};
pub use manager::{BindingSet, MappingEntry, SkippedBinding, SyncContext};
