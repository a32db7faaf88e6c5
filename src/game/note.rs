use serde::Deserialize;

use crate::game::judgment::Judgment;

pub const NUM_LANES: usize = 4;

/// One lyric word as it appears in a song's timing file.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct TimedWord {
    pub text: String,
    /// Target time in seconds from the start of playback.
    pub timestamp: f32,
    #[serde(default)]
    pub duration: f32,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LyricLine {
    pub words: Vec<TimedWord>,
}

/// Read-only lyric timing for a whole song, in line then word order.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "TrackRepr")]
pub struct TimingTrack {
    pub lines: Vec<LyricLine>,
}

// Timing files come either wrapped (`{"lines": [{"words": [..]}]}`) or as a
// bare array of word arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum TrackRepr {
    Wrapped { lines: Vec<LyricLine> },
    Bare(Vec<Vec<TimedWord>>),
}

impl From<TrackRepr> for TimingTrack {
    fn from(repr: TrackRepr) -> Self {
        match repr {
            TrackRepr::Wrapped { lines } => Self { lines },
            TrackRepr::Bare(lines) => Self {
                lines: lines.into_iter().map(|words| LyricLine { words }).collect(),
            },
        }
    }
}

impl TimingTrack {
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| l.words.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    /// Time of the last word's end, or 0 for an empty track.
    pub fn last_second(&self) -> f32 {
        self.lines
            .iter()
            .flat_map(|l| l.words.iter())
            .map(|w| w.timestamp + w.duration.max(0.0))
            .fold(0.0_f32, f32::max)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub translation: String,
    pub timestamp: f32,
    pub duration: f32,
    pub lane: usize,
    pub hit: bool,
    pub result: Option<Judgment>, // Set together with `hit`
}

impl Note {
    /// Flags the note as consumed. Returns false if it already was.
    pub(crate) fn mark_judged(&mut self, judgment: Judgment) -> bool {
        if self.hit {
            return false;
        }
        self.hit = true;
        self.result = Some(judgment);
        true
    }

    pub(crate) fn reset(&mut self) {
        self.hit = false;
        self.result = None;
    }
}
