//! Time management utilities

use std::time::{Duration, Instant};

/// Simulation clock advanced explicitly by the tick thread
///
/// Pools use this instead of wall-clock time so that auto-release deadlines
/// follow the simulation (pausing the loop pauses every countdown) and so
/// tests can drive time deterministically.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    elapsed: f64,
    tick_count: u64,
}

impl TickClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick of `delta_time` seconds
    ///
    /// Negative or non-finite deltas are ignored; the clock never runs backwards.
    pub fn advance(&mut self, delta_time: f32) {
        if delta_time.is_finite() && delta_time > 0.0 {
            self.elapsed += f64::from(delta_time);
        }
        self.tick_count += 1;
    }

    /// Seconds elapsed since the clock was created or reset
    pub fn now(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks observed
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Reset the clock to zero
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.tick_count = 0;
    }
}

/// Simple stopwatch for measuring elapsed wall time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start (or resume) the stopwatch
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
