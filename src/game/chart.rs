use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::game::note::{NUM_LANES, Note, TimingTrack};
use crate::game::song::{IdentityTranslator, Translator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(5);

    /// Clamps into 1..=5.
    pub const fn new(level: u8) -> Self {
        if level < 1 {
            Self::MIN
        } else if level > 5 {
            Self::MAX
        } else {
            Self(level)
        }
    }

    /// Whether the note at `index` in the flattened word list survives.
    #[inline(always)]
    pub const fn keeps(self, index: usize) -> bool {
        match self.0 {
            5 => true,
            4 => index % 4 != 3,
            3 => index % 2 == 0,
            2 => index % 3 == 0,
            _ => index % 5 == 0,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u8>() {
            Ok(v @ 1..=5) => Ok(Self(v)),
            _ => Err(()),
        }
    }
}

#[inline(always)]
pub const fn lane_for(line_index: usize, word_index: usize) -> usize {
    (line_index + word_index) % NUM_LANES
}

/// Builds the session's note list with translations left as the source text.
pub fn generate(track: &TimingTrack, difficulty: Difficulty) -> Vec<Note> {
    generate_with(track, difficulty, &IdentityTranslator)
}

pub fn generate_with(
    track: &TimingTrack,
    difficulty: Difficulty,
    translator: &dyn Translator,
) -> Vec<Note> {
    let mut notes = Vec::with_capacity(track.word_count());
    let mut flat_index = 0usize;
    for (line_index, line) in track.lines.iter().enumerate() {
        for (word_index, word) in line.words.iter().enumerate() {
            let keep = difficulty.keeps(flat_index);
            flat_index += 1;
            if !keep {
                continue;
            }
            notes.push(Note {
                id: format!("{line_index}-{word_index}"),
                text: word.text.clone(),
                translation: translator.translate(&word.text),
                timestamp: word.timestamp,
                duration: word.duration,
                lane: lane_for(line_index, word_index),
                hit: false,
                result: None,
            });
        }
    }
    debug!(
        "Generated {} of {} notes at difficulty {}",
        notes.len(),
        flat_index,
        difficulty
    );
    notes
}
