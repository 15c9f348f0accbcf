#![forbid(unsafe_code)]

//! Time-based progress and easing.
//!
//! An [`Animation`] accumulates elapsed time from externally supplied ticks
//! and reports a normalized value in [0.0, 1.0]. Nothing here reads a clock:
//! the caller decides how much time passed, which keeps every animation
//! deterministic under test.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in (slow start).
#[inline]
pub fn ease_in(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in-out.
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Look up an easing function by its kebab-case name.
///
/// Accepted names: `linear`, `ease-in`, `ease-out`, `ease-in-out`,
/// `ease-in-out-cubic`.
pub fn easing_by_name(name: &str) -> Option<EasingFn> {
    match name.trim().to_ascii_lowercase().as_str() {
        "linear" => Some(linear),
        "ease-in" => Some(ease_in),
        "ease-out" => Some(ease_out),
        "ease-in-out" => Some(ease_in_out),
        "ease-in-out-cubic" => Some(ease_in_out_cubic),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f64;

    /// Time elapsed past completion.
    /// Returns [`Duration::ZERO`] for animations that never complete.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progression from 0.0 to 1.0 over a fixed duration, with configurable easing.
///
/// Elapsed time is tracked as a [`Duration`], so many small ticks accumulate
/// without floating-point drift.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Progress {
    /// Create a progress clock with the given duration and linear easing.
    ///
    /// A zero duration completes on the first tick.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: linear,
        }
    }

    /// Set the easing function.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Total duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time accumulated so far (may exceed the duration).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Raw linear progress (before easing), in [0.0, 1.0].
    pub fn raw(&self) -> f64 {
        if self.elapsed >= self.duration {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

impl Animation for Progress {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f64 {
        (self.easing)(self.raw())
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
