//! Control binding - keeps one control and one engine parameter in step
//!
//! State machine per binding:
//! - Idle -> UserEditing: control input, written to the engine after
//!   recording the value, so the echo is recognized and dropped
//! - Idle -> Reconciling: engine change (push or poll) larger than epsilon,
//!   written to the control
//! - any -> Closed: teardown; nothing is delivered afterwards
//!
//! Races resolve as last event wins, in delivery order.

use crate::error::BindingError;
use crate::handles::{ControlHandle, EngineParameter, ParameterChange, Subscription};
use crate::poller::Poller;
use parking_lot::Mutex;
use rasm_params::{DisplayScale, ParameterId, ParameterSpec, ValueTransform};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Which channels deliver engine-side changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Engine change notifications only
    #[default]
    Push,
    /// Interval reads only
    Poll,
    /// Notifications with interval reads as a safety net
    Both,
}

impl SyncMode {
    pub fn uses_push(self) -> bool {
        matches!(self, SyncMode::Push | SyncMode::Both)
    }

    pub fn uses_poll(self) -> bool {
        matches!(self, SyncMode::Poll | SyncMode::Both)
    }
}

/// Per-binding synchronization settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingOptions {
    pub sync: SyncMode,
    /// Minimum engine-domain change that reaches the control
    pub epsilon: f64,
    /// Required when `sync` polls
    pub poll_interval: Option<Duration>,
    pub display: DisplayScale,
}

impl BindingOptions {
    pub fn push(epsilon: f64) -> Self {
        Self {
            sync: SyncMode::Push,
            epsilon,
            poll_interval: None,
            display: DisplayScale::default(),
        }
    }

    pub fn poll(epsilon: f64, interval: Duration) -> Self {
        Self {
            sync: SyncMode::Poll,
            epsilon,
            poll_interval: Some(interval),
            display: DisplayScale::default(),
        }
    }

    pub fn both(epsilon: f64, interval: Duration) -> Self {
        Self {
            sync: SyncMode::Both,
            ..Self::poll(epsilon, interval)
        }
    }

    pub fn with_display(mut self, display: DisplayScale) -> Self {
        self.display = display;
        self
    }

    pub fn validate(&self) -> Result<(), BindingError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(BindingError::InvalidEpsilon(self.epsilon));
        }
        if self.sync.uses_poll() && self.poll_interval.map_or(true, |i| i.is_zero()) {
            return Err(BindingError::InvalidPollInterval);
        }
        if !self.display.is_valid() {
            return Err(BindingError::InvalidDisplayScale);
        }
        Ok(())
    }
}

/// Logical synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    UserEditing,
    Reconciling,
    Closed,
}

/// Counters for diagnosing a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingStats {
    /// Values written to the engine
    pub engine_writes: u64,
    /// Values written to the control (including the initial reflection)
    pub control_writes: u64,
    /// Engine changes dropped as echo or sub-epsilon noise
    pub suppressed: u64,
    /// Engine values clamped back into range on read
    pub clamped: u64,
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Push,
    Poll,
}

struct SyncState {
    last_known: f64,
    phase: SyncPhase,
    stats: BindingStats,
}

struct Endpoints {
    control: Arc<dyn ControlHandle>,
    parameter: Arc<dyn EngineParameter>,
}

/// State shared with listener closures and the poll thread
struct Shared {
    control_id: String,
    parameter_id: ParameterId,
    transform: ValueTransform,
    epsilon: f64,
    alive: AtomicBool,
    endpoints: Mutex<Option<Endpoints>>,
    /// Serializes a user write against a poll's read and apply
    exchange: Mutex<()>,
    state: Mutex<SyncState>,
}

impl Shared {
    fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn parameter(&self) -> Option<Arc<dyn EngineParameter>> {
        self.endpoints.lock().as_ref().map(|e| e.parameter.clone())
    }

    fn control(&self) -> Option<Arc<dyn ControlHandle>> {
        self.endpoints.lock().as_ref().map(|e| e.control.clone())
    }

    /// User moved the control
    fn handle_input(&self, raw: f64) {
        if !self.is_live() {
            return;
        }
        let Some(parameter) = self.parameter() else {
            return;
        };
        let value = self.transform.to_engine(raw);
        let _exchange = self.exchange.lock();
        {
            let mut state = self.state.lock();
            if state.phase == SyncPhase::Closed {
                return;
            }
            state.phase = SyncPhase::UserEditing;
            state.last_known = value;
            state.stats.engine_writes += 1;
        }
        trace!(control = %self.control_id, parameter = %self.parameter_id, raw, value, "control input");

        // Not under the state lock: the engine may echo synchronously.
        // Push deliveries never take the exchange lock.
        parameter.set(value);

        let mut state = self.state.lock();
        if state.phase == SyncPhase::UserEditing {
            state.phase = SyncPhase::Idle;
        }
    }

    /// Engine reported a value, by notification or by poll
    fn handle_change(&self, reported: f64, origin: Origin) {
        if !self.is_live() {
            return;
        }
        let Some(control) = self.control() else {
            return;
        };
        let value = self.transform.clamp_engine(reported);

        // Held through the control write so teardown cannot overlap a delivery
        let mut state = self.state.lock();
        if state.phase == SyncPhase::Closed {
            return;
        }
        if value != reported {
            state.stats.clamped += 1;
            debug!(
                parameter = %self.parameter_id,
                reported,
                clamped = value,
                "engine value out of range"
            );
        }
        if (value - state.last_known).abs() <= self.epsilon {
            state.stats.suppressed += 1;
            return;
        }

        let previous = state.phase;
        state.phase = SyncPhase::Reconciling;
        state.last_known = value;
        state.stats.control_writes += 1;
        let position = self.transform.to_display(value);
        trace!(
            control = %self.control_id,
            parameter = %self.parameter_id,
            ?origin,
            value,
            position,
            "engine change"
        );
        control.set_value(position);
        state.phase = match previous {
            SyncPhase::UserEditing => SyncPhase::UserEditing,
            _ => SyncPhase::Idle,
        };
    }

    /// One poll step
    ///
    /// The read and the apply happen under the exchange lock, so a user
    /// write cannot land between them and be reverted by a stale read.
    fn poll(&self) {
        if !self.is_live() {
            return;
        }
        if let Some(parameter) = self.parameter() {
            let _exchange = self.exchange.lock();
            let value = parameter.get();
            self.handle_change(value, Origin::Poll);
        }
    }
}

/// Live link between one control and one engine parameter
pub struct ControlBinding {
    shared: Arc<Shared>,
    spec: ParameterSpec,
    options: BindingOptions,
    input_subscription: Option<Subscription>,
    push_subscription: Option<Subscription>,
    poller: Option<Poller>,
}

impl ControlBinding {
    /// Wire a control to an engine parameter
    ///
    /// Reflects the engine's current value onto the control, then starts
    /// listening in both directions.
    pub fn bind(
        control: Arc<dyn ControlHandle>,
        parameter: Arc<dyn EngineParameter>,
        spec: &ParameterSpec,
        options: BindingOptions,
    ) -> Result<Self, BindingError> {
        options.validate()?;

        let transform = ValueTransform::new(spec, options.display);
        let (lo, hi) = transform.display_range();
        control.set_range(lo, hi);
        control.set_step(transform.display_step());

        let initial = transform.clamp_engine(parameter.get());
        control.set_value(transform.to_display(initial));

        let control_id = control.id().to_string();
        let parameter_id = parameter.id().clone();
        let shared = Arc::new(Shared {
            control_id: control_id.clone(),
            parameter_id: parameter_id.clone(),
            transform,
            epsilon: options.epsilon,
            alive: AtomicBool::new(true),
            endpoints: Mutex::new(Some(Endpoints {
                control: control.clone(),
                parameter: parameter.clone(),
            })),
            exchange: Mutex::new(()),
            state: Mutex::new(SyncState {
                last_known: initial,
                phase: SyncPhase::Idle,
                stats: BindingStats {
                    control_writes: 1,
                    ..BindingStats::default()
                },
            }),
        });

        let mut binding = Self {
            shared,
            spec: spec.clone(),
            options,
            input_subscription: None,
            push_subscription: None,
            poller: None,
        };

        let weak = Arc::downgrade(&binding.shared);
        binding.input_subscription = Some(control.on_input(Arc::new(move |raw| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_input(raw);
            }
        })));

        if options.sync.uses_push() {
            let weak = Arc::downgrade(&binding.shared);
            let expected = parameter_id.clone();
            binding.push_subscription = Some(parameter.subscribe(Arc::new(
                move |change: &ParameterChange| {
                    if change.id != expected {
                        return;
                    }
                    if let Some(shared) = weak.upgrade() {
                        shared.handle_change(change.value, Origin::Push);
                    }
                },
            )));
        }

        if let Some(interval) = options.poll_interval.filter(|_| options.sync.uses_poll()) {
            let weak: Weak<Shared> = Arc::downgrade(&binding.shared);
            let poller = Poller::spawn(format!("rasm-poll-{}", control_id), interval, move || {
                match weak.upgrade() {
                    Some(shared) if shared.is_live() => {
                        shared.poll();
                        true
                    }
                    _ => false,
                }
            })
            .map_err(|e| BindingError::Poller(e.to_string()));
            // On failure the subscriptions are released by Drop
            binding.poller = Some(poller?);
        }

        debug!(
            control = %control_id,
            parameter = %parameter_id,
            sync = ?options.sync,
            epsilon = options.epsilon,
            initial,
            "binding created"
        );
        Ok(binding)
    }

    pub fn control_id(&self) -> &str {
        &self.shared.control_id
    }

    pub fn parameter_id(&self) -> &ParameterId {
        &self.shared.parameter_id
    }

    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    pub fn options(&self) -> &BindingOptions {
        &self.options
    }

    pub fn transform(&self) -> &ValueTransform {
        &self.shared.transform
    }

    /// Last value written to or observed from the engine
    pub fn last_known(&self) -> f64 {
        self.shared.state.lock().last_known
    }

    pub fn phase(&self) -> SyncPhase {
        self.shared.state.lock().phase
    }

    pub fn stats(&self) -> BindingStats {
        self.shared.state.lock().stats
    }

    pub fn is_live(&self) -> bool {
        self.shared.is_live()
    }

    /// Run one poll step now, regardless of sync mode
    ///
    /// [`BindingSet::poll_all`](crate::BindingSet::poll_all) only calls this
    /// for bindings that poll.
    pub fn poll_now(&self) {
        self.shared.poll();
    }

    /// Cancel listeners, stop polling and release both endpoints
    ///
    /// Idempotent. Once this returns no further update is delivered.
    pub fn teardown(&mut self) {
        if !self.shared.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        // Waits for any in-flight delivery to finish
        self.shared.state.lock().phase = SyncPhase::Closed;

        if let Some(mut sub) = self.input_subscription.take() {
            sub.cancel();
        }
        if let Some(mut sub) = self.push_subscription.take() {
            sub.cancel();
        }
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        self.shared.endpoints.lock().take();

        debug!(
            control = %self.shared.control_id,
            parameter = %self.shared.parameter_id,
            "binding torn down"
        );
    }
}

impl Drop for ControlBinding {
    fn drop(&mut self) {
        self.teardown();
    }
}
