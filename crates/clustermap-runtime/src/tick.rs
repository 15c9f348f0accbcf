#![forbid(unsafe_code)]

//! Tick sources.
//!
//! A [`TickSource`] hands out the time step for each animation frame.
//! [`FixedTicks`] is fully deterministic and meant for tests and offline
//! rendering; [`IntervalTicks`] sleeps between frames and reports the real
//! time that passed.

use std::thread;
use std::time::{Duration, Instant};

/// Supplies frame time steps.
pub trait TickSource {
    /// Time since the previous tick, or `None` when the source is exhausted.
    fn next_tick(&mut self) -> Option<Duration>;
}

/// A constant step, optionally limited to a number of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTicks {
    step: Duration,
    remaining: Option<usize>,
}

impl FixedTicks {
    /// Unlimited ticks of `step`.
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            remaining: None,
        }
    }

    /// Stop after `count` ticks.
    #[must_use]
    pub fn limit(mut self, count: usize) -> Self {
        self.remaining = Some(count);
        self
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl TickSource for FixedTicks {
    fn next_tick(&mut self) -> Option<Duration> {
        match &mut self.remaining {
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(self.step)
            }
            None => Some(self.step),
        }
    }
}

/// Wall-clock ticks paced by sleeping for `interval`.
#[derive(Debug, Clone)]
pub struct IntervalTicks {
    interval: Duration,
    last: Option<Instant>,
}

impl IntervalTicks {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Roughly 60 frames per second.
    pub fn sixty_fps() -> Self {
        Self::new(Duration::from_micros(16_667))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TickSource for IntervalTicks {
    fn next_tick(&mut self) -> Option<Duration> {
        let last = *self.last.get_or_insert_with(Instant::now);
        let target = last + self.interval;
        let now = Instant::now();
        if target > now {
            thread::sleep(target - now);
        }
        let now = Instant::now();
        self.last = Some(now);
        Some(now.duration_since(last))
    }
}
