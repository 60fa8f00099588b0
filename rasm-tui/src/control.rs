//! Slider controls - terminal stand-ins for range inputs
//!
//! A slider has two write paths. `set_value` is programmatic and silent;
//! `input` is the user path and notifies listeners. Bindings rely on the
//! silent path to avoid re-entering themselves.

use parking_lot::Mutex;
use rasm_params::ParameterSpec;
use rasm_sync::{ControlHandle, ControlSurface, InputListener, Subscription};
use std::sync::{Arc, Weak};

/// Default slider range and step, as an HTML range input has
const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_MAX: f64 = 100.0;
const DEFAULT_STEP: f64 = 1.0;

/// Point-in-time copy of a slider's value and range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSnapshot {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderSnapshot {
    /// Position of the value within the range, 0.0 - 1.0
    pub fn fraction(&self) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

struct SliderState {
    value: f64,
    min: f64,
    max: f64,
    step: f64,
    listeners: Vec<(u64, InputListener)>,
    next_token: u64,
}

impl SliderState {
    fn snap(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value } else { self.min };
        let value = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return value;
        }
        let k = ((value - self.min) / self.step + 0.5).floor();
        (self.min + k * self.step).clamp(self.min, self.max)
    }
}

/// One horizontal slider
pub struct SliderControl {
    id: String,
    state: Arc<Mutex<SliderState>>,
}

impl SliderControl {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            state: Arc::new(Mutex::new(SliderState {
                value: DEFAULT_MIN,
                min: DEFAULT_MIN,
                max: DEFAULT_MAX,
                step: DEFAULT_STEP,
                listeners: Vec::new(),
                next_token: 0,
            })),
        })
    }

    /// User-driven change: clamp, snap to step, store, notify listeners
    ///
    /// Returns the stored value.
    pub fn input(&self, raw: f64) -> f64 {
        let (value, listeners) = {
            let mut state = self.state.lock();
            let value = state.snap(raw);
            state.value = value;
            let listeners: Vec<InputListener> =
                state.listeners.iter().map(|(_, l)| l.clone()).collect();
            (value, listeners)
        };
        for listener in listeners {
            listener(value);
        }
        value
    }

    /// Move by a fraction of the range
    pub fn nudge(&self, fraction: f64) -> f64 {
        let snapshot = self.snapshot();
        self.input(snapshot.value + fraction * snapshot.span())
    }

    /// Move to a fraction of the range
    pub fn jump(&self, fraction: f64) -> f64 {
        let snapshot = self.snapshot();
        self.input(snapshot.min + fraction * snapshot.span())
    }

    pub fn snapshot(&self) -> SliderSnapshot {
        let state = self.state.lock();
        SliderSnapshot {
            value: state.value,
            min: state.min,
            max: state.max,
            step: state.step,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

impl ControlHandle for SliderControl {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> f64 {
        self.state.lock().value
    }

    /// Programmatic write; listeners are not notified
    fn set_value(&self, value: f64) {
        let mut state = self.state.lock();
        state.value = if value.is_finite() {
            value.clamp(state.min, state.max)
        } else {
            state.min
        };
    }

    fn on_input(&self, listener: InputListener) -> Subscription {
        let token = {
            let mut state = self.state.lock();
            let token = state.next_token;
            state.next_token += 1;
            state.listeners.push((token, listener));
            token
        };
        let state: Weak<Mutex<SliderState>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().listeners.retain(|(t, _)| *t != token);
            }
        })
    }

    fn set_range(&self, min: f64, max: f64) {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return;
        }
        let mut state = self.state.lock();
        state.min = min;
        state.max = max;
        state.value = state.value.clamp(min, max);
    }

    fn set_step(&self, step: f64) {
        if step.is_finite() && step >= 0.0 {
            self.state.lock().step = step;
        }
    }
}

/// A slider plus what the UI shows around it
pub struct SliderEntry {
    pub control: Arc<SliderControl>,
    pub label: String,
    pub spec: Option<ParameterSpec>,
}

/// Ordered set of sliders addressable by id
#[derive(Default)]
pub struct SliderBank {
    sliders: Vec<SliderEntry>,
}

impl SliderBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slider; returns its handle
    pub fn add(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        spec: Option<ParameterSpec>,
    ) -> Arc<SliderControl> {
        let control = SliderControl::new(id);
        self.sliders.push(SliderEntry {
            control: control.clone(),
            label: label.into(),
            spec,
        });
        control
    }

    /// Drop a slider, as if its element left the page
    pub fn remove(&mut self, id: &str) -> Option<SliderEntry> {
        let index = self.sliders.iter().position(|s| s.control.id() == id)?;
        Some(self.sliders.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&SliderEntry> {
        self.sliders.iter().find(|s| s.control.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&SliderEntry> {
        self.sliders.get(index)
    }

    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SliderEntry> {
        self.sliders.iter()
    }
}

impl ControlSurface for SliderBank {
    fn control(&self, id: &str) -> Option<Arc<dyn ControlHandle>> {
        self.get(id)
            .map(|s| s.control.clone() as Arc<dyn ControlHandle>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasm_params::{DisplayScale, ParameterId};
    use rasm_sync::{BindingOptions, ChangeListener, ControlBinding, EngineParameter};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine parameter that stores writes and never notifies
    struct Knob {
        id: ParameterId,
        value: Mutex<f64>,
    }

    impl Knob {
        fn new(id: &str, value: f64) -> Arc<Self> {
            Arc::new(Self {
                id: id.into(),
                value: Mutex::new(value),
            })
        }
    }

    impl EngineParameter for Knob {
        fn id(&self) -> &ParameterId {
            &self.id
        }

        fn name(&self) -> &str {
            self.id.as_str()
        }

        fn get(&self) -> f64 {
            *self.value.lock()
        }

        fn set(&self, value: f64) {
            *self.value.lock() = value;
        }

        fn subscribe(&self, _listener: ChangeListener) -> Subscription {
            Subscription::noop()
        }
    }

    #[test]
    fn test_input_snaps_and_notifies() {
        let slider = SliderControl::new("volume-slider");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = slider.on_input(Arc::new(move |v| sink.lock().push(v)));

        assert_eq!(slider.input(42.4), 42.0);
        assert_eq!(slider.input(42.5), 43.0);
        assert_eq!(slider.input(150.0), 100.0);
        assert_eq!(slider.input(f64::NAN), 0.0);
        assert_eq!(*seen.lock(), [42.0, 43.0, 100.0, 0.0]);
    }

    #[test]
    fn test_set_value_is_silent() {
        let slider = SliderControl::new("volume-slider");
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let _sub = slider.on_input(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        slider.set_value(37.25);
        assert_eq!(slider.value(), 37.25);
        slider.set_value(-5.0);
        assert_eq!(slider.value(), 0.0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_removes_listener() {
        let slider = SliderControl::new("a");
        let mut sub = slider.on_input(Arc::new(|_| {}));
        assert_eq!(slider.listener_count(), 1);
        sub.cancel();
        assert_eq!(slider.listener_count(), 0);
    }

    #[test]
    fn test_native_range() {
        let slider = SliderControl::new("sensitivity-slider");
        slider.set_range(20.0, 80.0);
        slider.set_step(5.0);
        assert_eq!(slider.value(), 20.0);
        assert_eq!(slider.input(33.0), 35.0);

        // Invalid ranges are ignored
        slider.set_range(5.0, 5.0);
        assert_eq!(slider.snapshot().min, 20.0);
    }

    #[test]
    fn test_binding_applies_wide_display_scale() {
        let slider = SliderControl::new("volume-slider");
        let volume = Knob::new("volume", 0.5);
        let spec = ParameterSpec::new("volume", 0.0, 1.0)
            .unwrap()
            .with_step(0.01)
            .unwrap();
        let options = BindingOptions::push(1e-4).with_display(DisplayScale::Normalized(1000.0));
        let _binding = ControlBinding::bind(slider.clone(), volume.clone(), &spec, options).unwrap();

        let snapshot = slider.snapshot();
        assert_eq!((snapshot.min, snapshot.max), (0.0, 1000.0));
        assert!((snapshot.step - 10.0).abs() < 1e-9);
        assert!((snapshot.value - 500.0).abs() < 1e-9);

        slider.jump(1.0);
        assert!((volume.get() - 1.0).abs() < 1e-9);
        slider.jump(0.25);
        assert!((volume.get() - 0.25).abs() < 1e-9);
        slider.jump(0.0);
        assert_eq!(volume.get(), 0.0);
    }

    #[test]
    fn test_nudge_and_jump() {
        let slider = SliderControl::new("a");
        slider.set_value(50.0);
        assert_eq!(slider.nudge(0.01), 51.0);
        assert_eq!(slider.nudge(-0.1), 41.0);
        assert_eq!(slider.jump(0.7), 70.0);
        assert_eq!(slider.jump(1.0), 100.0);
        assert!((slider.snapshot().fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bank_lookup_and_remove() {
        let mut bank = SliderBank::new();
        bank.add("volume-slider", "Volume", None);
        bank.add("release-slider", "Release", None);

        assert_eq!(bank.len(), 2);
        assert!(bank.control("volume-slider").is_some());
        assert!(bank.control("gain-slider").is_none());

        let removed = bank.remove("volume-slider").unwrap();
        assert_eq!(removed.label, "Volume");
        assert!(bank.control("volume-slider").is_none());
        assert_eq!(bank.at(0).unwrap().control.id(), "release-slider");
    }
}
