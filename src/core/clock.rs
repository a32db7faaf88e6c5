use std::cell::Cell;
use std::time::Instant;

/// Playback position as seen by the judge. Time starts at 0 for each session
/// and never runs backwards.
pub trait TimeSource {
    fn current_time(&self) -> f32;
    fn has_ended(&self) -> bool;
}

/// Host-driven clock, e.g. fed from an audio callback or a test.
#[derive(Debug, Default)]
pub struct ManualClock {
    time: Cell<f32>,
    ended: Cell<bool>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward. Earlier or non-finite values are ignored.
    pub fn set(&self, seconds: f32) {
        if seconds.is_finite() && seconds > self.time.get() {
            self.time.set(seconds);
        }
    }

    pub fn advance(&self, delta_seconds: f32) {
        self.set(self.time.get() + delta_seconds);
    }

    pub fn finish(&self) {
        self.ended.set(true);
    }

    pub fn reset(&self) {
        self.time.set(0.0);
        self.ended.set(false);
    }
}

impl TimeSource for ManualClock {
    #[inline(always)]
    fn current_time(&self) -> f32 {
        self.time.get()
    }

    #[inline(always)]
    fn has_ended(&self) -> bool {
        self.ended.get()
    }
}

/// Wall-clock playback for hosts without an audio position to read.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    started_at: Instant,
    rate: f32,
    length_seconds: Option<f32>,
}

impl WallClock {
    pub fn start(rate: f32, length_seconds: Option<f32>) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        Self { started_at: Instant::now(), rate, length_seconds }
    }
}

impl TimeSource for WallClock {
    fn current_time(&self) -> f32 {
        self.started_at.elapsed().as_secs_f32() * self.rate
    }

    fn has_ended(&self) -> bool {
        self.length_seconds
            .is_some_and(|len| self.current_time() >= len)
    }
}
