use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lyricflow::config::{self, Config};
use lyricflow::core::clock::{ManualClock, TimeSource};
use lyricflow::core::input::{self, InputEvent};
use lyricflow::game::chart::{self, Difficulty};
use lyricflow::game::gameplay::{self, GameplayEvent, GameplayOptions};
use lyricflow::game::note::{NUM_LANES, Note};
use lyricflow::game::song::{self, DictionaryTranslator, IdentityTranslator, Translator};
use lyricflow::game::stage_stats::StageSummary;
use lyricflow::game::timing_windows::TimingProfile;

// Virtual touch surface used for every other simulated press.
const TOUCH_SURFACE_WIDTH: f32 = 1080.0;
// Keep ticking a little after the last word so its window can close.
const TAIL_SECONDS: f32 = 1.0;

/// Plays a lyric timing track headlessly with a simulated player.
#[derive(Parser, Debug)]
#[command(name = "lyricflow", version)]
struct Args {
    /// Song identifier; the track is read from `<songs-dir>/<song-id>.json`.
    song_id: String,
    #[arg(long, default_value = config::CONFIG_PATH)]
    config: PathBuf,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    difficulty: Option<u8>,
    #[arg(long, env = "LYRICFLOW_SONGS_DIR")]
    songs_dir: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    log::set_max_level(log::LevelFilter::Warn);

    let args = Args::parse();
    config::load(&args.config);
    let mut cfg = config::get();
    if let Some(d) = args.difficulty {
        cfg.difficulty = Difficulty::new(d);
    }
    if let Some(dir) = args.songs_dir {
        cfg.songs_dir = dir;
    }
    if let Some(seed) = args.seed {
        cfg.autoplay_seed = seed;
    }
    log::set_max_level(cfg.log_level.as_level_filter());

    let summary = run_autoplay(&args.song_id, &cfg)?;
    print_summary(&summary);
    Ok(())
}

fn load_translator(cfg: &Config) -> Box<dyn Translator> {
    let Some(path) = cfg.translations_file.as_ref() else {
        return Box::new(IdentityTranslator);
    };
    match DictionaryTranslator::load(path) {
        Ok(dict) => {
            info!("Loaded {} translations from {}", dict.len(), path.display());
            Box::new(dict)
        }
        Err(e) => {
            warn!("{e}; translations disabled");
            Box::new(IdentityTranslator)
        }
    }
}

/// Presses for every note the simulated player does not drop, sorted by time.
/// Alternates keyboard and touch so both adapters are driven.
fn plan_presses(notes: &[Note], cfg: &Config, rng: &mut StdRng) -> Vec<InputEvent> {
    let jitter_s = cfg.autoplay_jitter_ms / 1000.0;
    let keys = cfg.keymap.keys();
    let band = TOUCH_SURFACE_WIDTH / NUM_LANES as f32;
    let mut presses: Vec<InputEvent> = Vec::with_capacity(notes.len());
    for (i, n) in notes.iter().enumerate() {
        if rng.random::<f32>() < cfg.autoplay_miss_chance {
            continue;
        }
        let t = n.timestamp + rng.random_range(-jitter_s..=jitter_s);
        let press = if i % 2 == 0 {
            input::key_event(&cfg.keymap, keys[n.lane], t)
        } else {
            input::touch_event((n.lane as f32 + 0.5) * band, TOUCH_SURFACE_WIDTH, t)
        };
        presses.extend(press);
    }
    presses.sort_by(|a, b| a.music_time.total_cmp(&b.music_time));
    presses
}

fn run_autoplay(song_id: &str, cfg: &Config) -> Result<StageSummary, Box<dyn Error>> {
    let track = song::load_track_or_empty(&cfg.songs_dir, song_id);
    let translator = load_translator(cfg);
    let notes = chart::generate_with(&track, cfg.difficulty, translator.as_ref());

    let mut rng = if cfg.autoplay_seed == 0 {
        StdRng::from_os_rng()
    } else {
        StdRng::seed_from_u64(cfg.autoplay_seed)
    };
    let presses = plan_presses(&notes, cfg, &mut rng);
    info!("Autoplay planned {} presses for {} notes", presses.len(), notes.len());

    let options = GameplayOptions {
        timing_profile: TimingProfile::default().scaled(cfg.window_scale),
        lookahead_seconds: cfg.lookahead_seconds,
    };
    let mut state = gameplay::init(song_id, cfg.difficulty, notes, options);

    let clock = ManualClock::new();
    let song_end = track.last_second() + TAIL_SECONDS;
    let dt = 1.0 / cfg.tick_rate.max(1) as f32;
    let mut next_press = 0usize;

    loop {
        clock.advance(dt);
        let now = clock.current_time();
        while next_press < presses.len() && presses[next_press].music_time <= now {
            let p = presses[next_press];
            gameplay::queue_input_edge(&mut state, p.lane.index(), p.music_time);
            next_press += 1;
        }
        if now >= song_end {
            clock.finish();
        }
        for event in gameplay::update_from_clock(&mut state, &clock) {
            if let GameplayEvent::SessionEnded(summary) = event {
                return Ok(*summary);
            }
            report(&event);
        }
    }
}

fn report(event: &GameplayEvent) {
    match event {
        GameplayEvent::NoteSpawned { note_index, lane } => {
            debug!("spawn #{note_index} in lane {lane}");
        }
        GameplayEvent::Judged(r) => {
            let translation = if r.note.translation == r.note.text {
                String::new()
            } else {
                format!(" ({})", r.note.translation)
            };
            info!(
                "{:<7} lane {} '{}'{} {:+.1} ms",
                r.grade.label(),
                r.lane,
                r.note.text,
                translation,
                r.time_error_ms
            );
        }
        GameplayEvent::Missed(n) => info!("MISS    lane {} '{}'", n.lane, n.text),
        GameplayEvent::EmptyPress { lane } => debug!("empty press in lane {lane}"),
        GameplayEvent::Milestone { streak, message } => info!("{message} ({streak} streak)"),
        GameplayEvent::SessionEnded(_) => {}
    }
}

fn print_summary(s: &StageSummary) {
    let w = &s.window_counts;
    println!("Song:       {} (difficulty {})", s.song_id, s.difficulty);
    println!("Grade:      {} ({:.2}%)", s.grade, s.hit_percent);
    println!("Score:      {}", s.score);
    println!("Hits:       {}/{}", s.hit_count, s.total_notes);
    println!("Max streak: {}", s.max_streak);
    println!(
        "Judgments:  perfect {} / good {} / ok {} / miss {}",
        w.perfect, w.good, w.ok, w.miss
    );
    println!(
        "Timing:     mean {:+.1} ms, mean abs {:.1} ms, stddev {:.1} ms",
        s.timing_stats.mean_ms, s.timing_stats.mean_abs_ms, s.timing_stats.stddev_ms
    );
    println!("Finished:   {}", s.finished_at.format("%Y-%m-%d %H:%M:%S"));
}
