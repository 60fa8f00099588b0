//! Binding errors

use rasm_params::{ParameterId, RegistryError};
use thiserror::Error;

/// Reasons a binding could not be created
///
/// None of these are fatal: the binding set logs them and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error(transparent)]
    Spec(#[from] RegistryError),
    #[error("control '{0}' not found")]
    ControlNotFound(String),
    #[error("engine parameter '{0}' not found by name or id")]
    ParameterNotFound(ParameterId),
    #[error("epsilon must be finite and non-negative, got {0}")]
    InvalidEpsilon(f64),
    #[error("poll interval must be set and non-zero when polling")]
    InvalidPollInterval,
    #[error("display scale must be finite and positive")]
    InvalidDisplayScale,
    #[error("failed to start poll thread: {0}")]
    Poller(String),
}
