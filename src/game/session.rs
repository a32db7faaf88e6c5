use crate::game::judgment::{JudgeGrade, grade_points_for};

/// Running totals for one play of a song.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub score: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub hit_count: u32,
}

/// What the presentation layer needs to redraw the HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub score: u32,
    pub streak: u32,
    pub max_streak: u32,
}

impl SessionState {
    pub fn apply_hit(&mut self, grade: JudgeGrade) {
        if grade == JudgeGrade::Miss {
            self.apply_miss();
            return;
        }
        self.score = self.score.saturating_add(grade_points_for(grade));
        self.streak = self.streak.saturating_add(1);
        self.max_streak = self.max_streak.max(self.streak);
        self.hit_count = self.hit_count.saturating_add(1);
    }

    // Score, max streak and hit count survive a miss.
    #[inline(always)]
    pub fn apply_miss(&mut self) {
        self.streak = 0;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            score: self.score,
            streak: self.streak,
            max_streak: self.max_streak,
        }
    }
}

/// One-shot encouragement for streak milestones. Past 50 every multiple of
/// 25 triggers.
pub fn streak_milestone_message(streak: u32) -> Option<&'static str> {
    match streak {
        3 => Some("Nice start!"),
        5 => Some("You're warming up!"),
        8 => Some("Keep it going!"),
        10 => Some("In the flow!"),
        13 => Some("Great rhythm!"),
        15 => Some("On fire!"),
        18 => Some("Unstoppable!"),
        20 => Some("Amazing flow!"),
        25 => Some("Incredible!"),
        30 => Some("Fantastic!"),
        35 => Some("Superb timing!"),
        40 => Some("Phenomenal!"),
        45 => Some("Legendary!"),
        50 => Some("Perfect harmony!"),
        s if s > 50 && s % 25 == 0 => Some("Master of the flow!"),
        _ => None,
    }
}
