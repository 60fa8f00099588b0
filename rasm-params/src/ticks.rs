//! Tick marks for stepped controls

use crate::spec::ParameterSpec;
use crate::transform::DEFAULT_DISPLAY_SCALE;

/// Evenly spaced tick positions across a display range
///
/// Yields `step_count + 1` positions from `0` to `scale` inclusive.
/// Cloning restarts the sequence.
#[derive(Debug, Clone)]
pub struct Ticks {
    next: u64,
    len: u64,
    /// Tick `i` sits at `i * step / span` of the way along the display
    step: f64,
    span: f64,
    scale: f64,
    inverted: bool,
}

/// Tick positions over the default 0..100 display
pub fn ticks(step_count: f64) -> Ticks {
    Ticks::with_scale(step_count, DEFAULT_DISPLAY_SCALE)
}

impl Ticks {
    /// Tick positions over `0..=scale`
    ///
    /// Fractional counts are floored; a count that is not finite or floors
    /// to zero or below produces no ticks.
    pub fn with_scale(step_count: f64, scale: f64) -> Self {
        let steps = if step_count.is_finite() && step_count >= 1.0 {
            step_count.floor() as u32
        } else {
            0
        };
        let len = if steps == 0 { 0 } else { steps as u64 + 1 };
        Self {
            next: 0,
            len,
            step: 1.0,
            span: f64::from(steps),
            scale,
            inverted: false,
        }
    }

    /// Ticks at the display positions of a stepped spec's legal values
    ///
    /// One tick per `min + k * step`. When the step does not divide the
    /// range the last tick stops short of the end. Inverted specs are
    /// mirrored; continuous specs get none.
    pub fn for_spec(spec: &ParameterSpec, scale: f64) -> Self {
        let Some(steps) = spec.step_count().filter(|&n| n > 0) else {
            return Self::with_scale(0.0, scale);
        };
        Self {
            next: 0,
            len: u64::from(steps) + 1,
            step: spec.step(),
            span: spec.max() - spec.min(),
            scale,
            inverted: spec.is_inverted(),
        }
    }
}

impl Iterator for Ticks {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.len {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let fraction = (i as f64 * self.step / self.span).min(1.0);
        let fraction = if self.inverted { 1.0 - fraction } else { fraction };
        Some(fraction * self.scale)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Ticks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_steps() {
        let positions: Vec<f64> = ticks(12.0).collect();
        assert_eq!(positions.len(), 13);
        assert_eq!(positions[0], 0.0);
        assert_eq!(positions[12], 100.0);
        for pair in positions.windows(2) {
            assert!((pair[1] - pair[0] - 100.0 / 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_counts_are_empty() {
        for count in [0.0, -3.0, 0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(ticks(count).count(), 0, "count {}", count);
        }
    }

    #[test]
    fn test_restartable_and_idempotent() {
        let t = ticks(4.0);
        let first: Vec<f64> = t.clone().collect();
        let second: Vec<f64> = t.collect();
        assert_eq!(first, second);
        assert_eq!(first, ticks(4.0).collect::<Vec<_>>());
        assert_eq!(first, [0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_exact_size() {
        let mut t = ticks(10.0);
        assert_eq!(t.len(), 11);
        t.next();
        assert_eq!(t.len(), 10);
    }

    #[test]
    fn test_fractional_count_floors() {
        assert_eq!(ticks(2.7).collect::<Vec<_>>(), [0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_for_spec() {
        let sensitivity = ParameterSpec::new("sensitivity", 20.0, 80.0)
            .unwrap()
            .with_step(5.0)
            .unwrap();
        assert_eq!(Ticks::for_spec(&sensitivity, 100.0).len(), 13);

        let continuous = ParameterSpec::new("volume", 0.0, 1.0).unwrap();
        assert_eq!(Ticks::for_spec(&continuous, 100.0).len(), 0);

        let scaled: Vec<f64> = Ticks::for_spec(&sensitivity, 1.0).collect();
        assert_eq!(scaled.last(), Some(&1.0));
    }

    #[test]
    fn test_for_spec_stays_on_legal_values() {
        // Grid is 0, 3, 6, 9; nothing is drawn at 10
        let odd = ParameterSpec::new("odd", 0.0, 10.0).unwrap().with_step(3.0).unwrap();
        let positions: Vec<f64> = Ticks::for_spec(&odd, 100.0).collect();
        assert_eq!(positions.len(), 4);
        for (pos, expected) in positions.iter().zip([0.0, 30.0, 60.0, 90.0]) {
            assert!((pos - expected).abs() < 1e-9, "{} vs {}", pos, expected);
        }

        // Inverted: engine 0 sits at the top of the display
        let positions: Vec<f64> = Ticks::for_spec(&odd.inverted(true), 100.0).collect();
        for (pos, expected) in positions.iter().zip([100.0, 70.0, 40.0, 10.0]) {
            assert!((pos - expected).abs() < 1e-9, "{} vs {}", pos, expected);
        }
    }
}
