use log::{LevelFilter, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::core::input::Keymap;
use crate::game::chart::Difficulty;
use crate::game::gameplay::DEFAULT_LOOKAHEAD_SECONDS;

pub const CONFIG_PATH: &str = "lyricflow.ini";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content);
        Ok(())
    }

    pub fn load_str(&mut self, content: &str) {
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let section = line[1..line.len() - 1].trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some(eq_idx) = line.find('=') {
                let (key_raw, value_raw) = line.split_at(eq_idx);
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                let value = value_raw[1..].trim().to_string();
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub difficulty: Difficulty,
    pub log_level: LogLevel,
    pub songs_dir: PathBuf,
    /// Optional JSON dictionary of word translations.
    pub translations_file: Option<PathBuf>,
    pub lookahead_seconds: f32,
    /// Multiplies every timing window; 1.0 keeps the stock 80/150/250 ms.
    pub window_scale: f32,
    /// Scheduling ticks per second for the headless runner.
    pub tick_rate: u32,
    pub keymap: Keymap,
    pub autoplay_jitter_ms: f32,
    // 0.0..=1.0
    pub autoplay_miss_chance: f32,
    // 0 = seed from entropy
    pub autoplay_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::MAX,
            log_level: LogLevel::Warn,
            songs_dir: PathBuf::from("songs"),
            translations_file: None,
            lookahead_seconds: DEFAULT_LOOKAHEAD_SECONDS,
            window_scale: 1.0,
            tick_rate: 60,
            keymap: Keymap::default(),
            autoplay_jitter_ms: 60.0,
            autoplay_miss_chance: 0.05,
            autoplay_seed: 0,
        }
    }
}

impl Config {
    /// Reads every known key, keeping the default for anything missing or
    /// unparsable.
    pub fn from_ini(conf: &SimpleIni) -> Self {
        let default = Config::default();
        Self {
            difficulty: conf
                .get("Options", "Difficulty")
                .and_then(|v| Difficulty::from_str(&v).ok())
                .unwrap_or(default.difficulty),
            log_level: conf
                .get("Options", "LogLevel")
                .and_then(|v| LogLevel::from_str(&v).ok())
                .unwrap_or(default.log_level),
            songs_dir: conf
                .get("Options", "SongsDir")
                .filter(|v| !v.is_empty())
                .map_or(default.songs_dir, PathBuf::from),
            translations_file: conf
                .get("Options", "TranslationsFile")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            lookahead_seconds: conf
                .get("Options", "LookaheadSeconds")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(default.lookahead_seconds),
            window_scale: conf
                .get("Options", "WindowScale")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| v.clamp(0.25, 4.0))
                .unwrap_or(default.window_scale),
            tick_rate: conf
                .get("Options", "TickRate")
                .and_then(|v| v.parse::<u32>().ok())
                .map(|v| v.clamp(1, 1000))
                .unwrap_or(default.tick_rate),
            keymap: conf
                .get("Options", "KeyLanes")
                .and_then(|v| Keymap::from_str(&v).ok())
                .unwrap_or(default.keymap),
            autoplay_jitter_ms: conf
                .get("Autoplay", "JitterMs")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .map(f32::abs)
                .unwrap_or(default.autoplay_jitter_ms),
            autoplay_miss_chance: conf
                .get("Autoplay", "MissChance")
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(default.autoplay_miss_chance),
            autoplay_seed: conf
                .get("Autoplay", "Seed")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default.autoplay_seed),
        }
    }

    fn to_ini_string(&self) -> String {
        let keys: String = self.keymap.keys().iter().collect();
        let translations = self
            .translations_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut content = String::new();
        // [Options] section - keys in alphabetical order
        content.push_str("[Options]\n");
        content.push_str(&format!("Difficulty={}\n", self.difficulty));
        content.push_str(&format!("KeyLanes={keys}\n"));
        content.push_str(&format!("LogLevel={}\n", self.log_level.as_str()));
        content.push_str(&format!("LookaheadSeconds={}\n", self.lookahead_seconds));
        content.push_str(&format!("SongsDir={}\n", self.songs_dir.display()));
        content.push_str(&format!("TickRate={}\n", self.tick_rate));
        content.push_str(&format!("TranslationsFile={translations}\n"));
        content.push_str(&format!("WindowScale={}\n", self.window_scale));
        content.push('\n');

        content.push_str("[Autoplay]\n");
        content.push_str(&format!("JitterMs={}\n", self.autoplay_jitter_ms));
        content.push_str(&format!("MissChance={}\n", self.autoplay_miss_chance));
        content.push_str(&format!("Seed={}\n", self.autoplay_seed));
        content
    }
}

// Global configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

// --- File I/O ---

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    std::fs::write(path, Config::default().to_ini_string())
}

pub fn load(path: &Path) {
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }

    let mut conf = SimpleIni::new();
    let cfg = match conf.load(path) {
        Ok(()) => Config::from_ini(&conf),
        Err(e) => {
            warn!("Failed to read '{}': {e}; using defaults.", path.display());
            Config::default()
        }
    };
    info!("Configuration loaded: {cfg:?}");
    *CONFIG.lock().unwrap_or_else(PoisonError::into_inner) = cfg;
}

pub fn get() -> Config {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner).clone()
}
