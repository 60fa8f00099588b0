//! Capability traits for the two externally owned endpoints of a binding
//!
//! The engine side is a set of [`EngineParameter`] handles reachable through a
//! [`ParameterSource`]; the UI side is a set of [`ControlHandle`]s reachable
//! through a [`ControlSurface`]. Neither is owned by this crate.

use rasm_params::ParameterId;
use std::fmt;
use std::sync::Arc;

/// Change notification fired by an engine parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChange {
    pub id: ParameterId,
    pub value: f64,
}

/// Callback for engine change notifications
pub type ChangeListener = Arc<dyn Fn(&ParameterChange) + Send + Sync>;

/// Callback for user input on a control
pub type InputListener = Arc<dyn Fn(f64) + Send + Sync>;

/// Guard for a registered listener
///
/// Cancelling runs the canceller exactly once; dropping the guard cancels.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to cancel (engines without push support)
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// One parameter of the external engine
pub trait EngineParameter: Send + Sync {
    fn id(&self) -> &ParameterId;

    fn name(&self) -> &str;

    /// Current value
    fn get(&self) -> f64;

    /// Request a new value; the engine may clamp or quantize it again
    fn set(&self, value: f64);

    /// Register for change notifications from any origin, including our own writes
    ///
    /// Listeners may be invoked synchronously from inside `set`, so callers
    /// must not hold locks the listener needs while writing.
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

/// One UI control (a slider)
pub trait ControlHandle: Send + Sync {
    fn id(&self) -> &str;

    fn value(&self) -> f64;

    /// Programmatic write; must not fire input listeners
    fn set_value(&self, value: f64);

    /// Register for user-originated input
    fn on_input(&self, listener: InputListener) -> Subscription;

    fn set_range(&self, _min: f64, _max: f64) {}

    fn set_step(&self, _step: f64) {}
}

/// Live set of engine parameters
pub trait ParameterSource: Send + Sync {
    fn parameters(&self) -> Vec<Arc<dyn EngineParameter>>;

    /// Resolve a configured key to a parameter handle
    ///
    /// Matches by name first and falls back to matching by id, so
    /// configurations may address parameters either way.
    fn resolve(&self, key: &ParameterId) -> Option<Arc<dyn EngineParameter>> {
        let parameters = self.parameters();
        parameters
            .iter()
            .find(|p| p.name() == key.as_str())
            .or_else(|| parameters.iter().find(|p| p.id() == key))
            .cloned()
    }
}

/// Live set of UI controls
pub trait ControlSurface: Send + Sync {
    fn control(&self, id: &str) -> Option<Arc<dyn ControlHandle>>;
}
