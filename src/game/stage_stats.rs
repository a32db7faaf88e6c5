use chrono::{DateTime, Local};

use crate::game::chart::Difficulty;
use crate::game::note::Note;
use crate::game::scores::{self, Grade};
use crate::game::session::SessionState;
use crate::game::timing_stats::{self, TimingStats, WindowCounts};

/// End-of-session results handed to the evaluation layer.
#[derive(Clone, Debug)]
pub struct StageSummary {
    pub song_id: String,
    pub difficulty: Difficulty,
    pub grade: Grade,
    pub hit_percent: f64,
    pub score: u32,
    pub max_streak: u32,
    pub hit_count: u32,
    pub total_notes: usize,
    pub window_counts: WindowCounts,
    pub timing_stats: TimingStats,
    pub finished_at: DateTime<Local>,
}

impl StageSummary {
    pub fn build(
        song_id: &str,
        difficulty: Difficulty,
        session: &SessionState,
        notes: &[Note],
    ) -> Self {
        let total_notes = notes.len();
        Self {
            song_id: song_id.to_string(),
            difficulty,
            grade: scores::score_to_grade(session.hit_count, total_notes),
            hit_percent: scores::hit_percent(session.hit_count, total_notes),
            score: session.score,
            max_streak: session.max_streak,
            hit_count: session.hit_count,
            total_notes,
            window_counts: timing_stats::compute_window_counts(notes),
            timing_stats: timing_stats::compute_note_timing_stats(notes),
            finished_at: Local::now(),
        }
    }
}
