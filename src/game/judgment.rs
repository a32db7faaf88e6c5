use crate::game::note::Note;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect,
    Good,
    Ok,
    Miss,
}

impl JudgeGrade {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Good => "GOOD",
            Self::Ok => "OK",
            Self::Miss => "MISS",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Judgment {
    pub time_error_ms: f32, // Signed: negative when the press came early
    pub grade: JudgeGrade,
}

/// What the presentation layer receives for a successful press.
#[derive(Clone, Debug, PartialEq)]
pub struct JudgmentResult {
    pub lane: usize,
    pub grade: JudgeGrade,
    pub time_error_ms: f32,
    pub note_index: usize,
    pub note: Note,
}

pub const POINTS_PER_HIT: u32 = 25;

// Every non-miss tier scores the same; the tier only drives feedback.
pub const fn grade_points_for(grade: JudgeGrade) -> u32 {
    match grade {
        JudgeGrade::Perfect | JudgeGrade::Good | JudgeGrade::Ok => POINTS_PER_HIT,
        JudgeGrade::Miss => 0,
    }
}
