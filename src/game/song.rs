use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::game::note::TimingTrack;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("No timing file for song '{song_id}' at {}", .path.display())]
    NotFound { song_id: String, path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed timing data in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[inline(always)]
pub fn track_path(songs_dir: &Path, song_id: &str) -> PathBuf {
    songs_dir.join(format!("{song_id}.json"))
}

/// Reads `<songs_dir>/<song_id>.json`.
pub fn load_track(songs_dir: &Path, song_id: &str) -> Result<TimingTrack, TrackError> {
    let path = track_path(songs_dir, song_id);
    if !path.is_file() {
        return Err(TrackError::NotFound { song_id: song_id.to_string(), path });
    }
    let content = fs::read_to_string(&path).map_err(|source| TrackError::Io {
        path: path.clone(),
        source,
    })?;
    let track: TimingTrack =
        serde_json::from_str(&content).map_err(|source| TrackError::Parse { path, source })?;
    info!(
        "Loaded timing track '{}' ({} lines, {} words)",
        song_id,
        track.lines.len(),
        track.word_count()
    );
    Ok(track)
}

/// A missing or broken track is not fatal: the session just has no notes.
pub fn load_track_or_empty(songs_dir: &Path, song_id: &str) -> TimingTrack {
    match load_track(songs_dir, song_id) {
        Ok(track) => track,
        Err(e) => {
            warn!("{e}; continuing with an empty track");
            TimingTrack::empty()
        }
    }
}

/// Word translation lookup. Returning the input unchanged means "no
/// translation available"; the core stores whatever comes back.
pub trait Translator {
    fn translate(&self, word: &str) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    #[inline(always)]
    fn translate(&self, word: &str) -> String {
        word.to_string()
    }
}

#[derive(Clone, Debug, Default)]
pub struct DictionaryTranslator {
    entries: FxHashMap<String, String>,
}

impl DictionaryTranslator {
    pub fn new(entries: FxHashMap<String, String>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self { entries }
    }

    /// Loads a flat JSON object of `word -> translation`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: FxHashMap<String, String> =
            serde_json::from_str(&content).map_err(|source| TrackError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

impl Translator for DictionaryTranslator {
    fn translate(&self, word: &str) -> String {
        let key = strip_punctuation(word).to_lowercase();
        self.entries
            .get(&key)
            .cloned()
            .unwrap_or_else(|| word.to_string())
    }
}
