// Shared timing window definitions so the judge, the miss sweep and any
// visuals agree on the same thresholds.

use crate::game::judgment::JudgeGrade;

// All windows are absolute offsets in seconds.
pub const PERFECT_WINDOW_S: f32 = 0.08;
pub const GOOD_WINDOW_S: f32 = 0.15;
pub const MISS_WINDOW_S: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingProfile {
    // Upper bounds for Perfect, Good and Ok. The last one doubles as the
    // miss window.
    pub windows_s: [f32; 3],
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self { windows_s: [PERFECT_WINDOW_S, GOOD_WINDOW_S, MISS_WINDOW_S] }
    }
}

impl TimingProfile {
    /// Scales every window by `factor`. Non-finite or non-positive factors
    /// leave the profile unchanged.
    pub fn scaled(self, factor: f32) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return self;
        }
        let w = self.windows_s;
        Self { windows_s: [w[0] * factor, w[1] * factor, w[2] * factor] }
    }

    #[inline(always)]
    pub fn miss_window_s(&self) -> f32 {
        self.windows_s[2]
    }

    #[inline(always)]
    pub fn windows_ms(&self) -> [f32; 3] {
        let s = self.windows_s;
        [s[0] * 1000.0, s[1] * 1000.0, s[2] * 1000.0]
    }
}

/// Classifies a signed offset. Anything past the last window is a Miss.
#[inline(always)]
pub fn classify_offset_s(offset_s: f32, profile: &TimingProfile) -> JudgeGrade {
    let abs = offset_s.abs();
    let w = profile.windows_s;
    if abs <= w[0] {
        JudgeGrade::Perfect
    } else if abs <= w[1] {
        JudgeGrade::Good
    } else if abs <= w[2] {
        JudgeGrade::Ok
    } else {
        JudgeGrade::Miss
    }
}
