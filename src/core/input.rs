use std::str::FromStr;

use crate::game::note::NUM_LANES;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    Left = 0,
    Down = 1,
    Up = 2,
    Right = 3,
}

impl Lane {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Lane> {
        match index {
            0 => Some(Lane::Left),
            1 => Some(Lane::Down),
            2 => Some(Lane::Up),
            3 => Some(Lane::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Touch,
}

/// A press already resolved to a lane, stamped with the playback time it
/// happened at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub lane: Lane,
    pub source: InputSource,
    pub music_time: f32,
}

/// Four keyboard keys, one per lane, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keymap {
    keys: [char; NUM_LANES],
}

impl Default for Keymap {
    fn default() -> Self {
        Self { keys: ['d', 'f', 'j', 'k'] }
    }
}

impl Keymap {
    pub const fn new(keys: [char; NUM_LANES]) -> Self {
        Self { keys }
    }

    pub const fn keys(&self) -> [char; NUM_LANES] {
        self.keys
    }

    #[inline(always)]
    pub fn lane_for_key(&self, key: char) -> Option<Lane> {
        let key = key.to_ascii_lowercase();
        self.keys
            .iter()
            .position(|&k| k.to_ascii_lowercase() == key)
            .and_then(Lane::from_index)
    }
}

impl FromStr for Keymap {
    type Err = ();

    // Exactly four distinct characters, e.g. "dfjk".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().map(|c| c.to_ascii_lowercase()).collect();
        if chars.len() != NUM_LANES {
            return Err(());
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[i + 1..].contains(c) {
                return Err(());
            }
        }
        Ok(Self { keys: [chars[0], chars[1], chars[2], chars[3]] })
    }
}

/// Splits the touch surface into four equal-width bands. Positions outside
/// the surface clamp to the nearest edge band.
#[inline(always)]
pub fn lane_from_touch(x: f32, surface_width: f32) -> Option<Lane> {
    if !x.is_finite() || !surface_width.is_finite() || surface_width <= 0.0 {
        return None;
    }
    let band = surface_width / NUM_LANES as f32;
    let idx = (x.clamp(0.0, surface_width) / band).floor() as usize;
    Lane::from_index(idx.min(NUM_LANES - 1))
}

pub fn key_event(keymap: &Keymap, key: char, music_time: f32) -> Option<InputEvent> {
    keymap.lane_for_key(key).map(|lane| InputEvent {
        lane,
        source: InputSource::Keyboard,
        music_time,
    })
}

pub fn touch_event(x: f32, surface_width: f32, music_time: f32) -> Option<InputEvent> {
    lane_from_touch(x, surface_width).map(|lane| InputEvent {
        lane,
        source: InputSource::Touch,
        music_time,
    })
}
