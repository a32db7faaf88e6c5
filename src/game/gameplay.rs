use std::collections::VecDeque;

use log::{debug, info};
use smallvec::SmallVec;

use crate::core::clock::TimeSource;
use crate::game::chart::Difficulty;
use crate::game::judgment::{JudgeGrade, Judgment, JudgmentResult};
use crate::game::note::{NUM_LANES, Note};
use crate::game::session::{SessionSnapshot, SessionState, streak_milestone_message};
use crate::game::stage_stats::StageSummary;
use crate::game::timing_windows::{TimingProfile, classify_offset_s};

pub const DEFAULT_LOOKAHEAD_SECONDS: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameplayOptions {
    pub timing_profile: TimingProfile,
    /// How long before its target time a note is announced as visible.
    pub lookahead_seconds: f32,
}

impl Default for GameplayOptions {
    fn default() -> Self {
        Self {
            timing_profile: TimingProfile::default(),
            lookahead_seconds: DEFAULT_LOOKAHEAD_SECONDS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct InputEdge {
    lane: usize,
    event_time: f32,
}

#[derive(Clone, Debug)]
pub enum GameplayEvent {
    NoteSpawned { note_index: usize, lane: usize },
    Judged(JudgmentResult),
    Missed(Note),
    /// A press that found nothing to judge; only worth a lane flash.
    EmptyPress { lane: usize },
    Milestone { streak: u32, message: &'static str },
    SessionEnded(Box<StageSummary>),
}

pub type GameplayEvents = SmallVec<[GameplayEvent; 8]>;

pub struct State {
    pub song_id: String,
    pub difficulty: Difficulty,
    pub notes: Vec<Note>,
    pub session: SessionState,
    pub timing_profile: TimingProfile,
    pub lookahead_seconds: f32,
    pending_inputs: VecDeque<InputEdge>,
    // Every note before this index is already judged.
    next_pending_cursor: usize,
    // Note indices by timestamp; ties keep sequence order.
    spawn_order: Vec<usize>,
    note_spawn_cursor: usize,
    summary: Option<StageSummary>,
}

impl State {
    #[inline(always)]
    pub fn is_ended(&self) -> bool {
        self.summary.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    fn advance_pending_cursor(&mut self) {
        while self.next_pending_cursor < self.notes.len()
            && self.notes[self.next_pending_cursor].hit
        {
            self.next_pending_cursor += 1;
        }
    }
}

pub fn init(song_id: &str, difficulty: Difficulty, notes: Vec<Note>, options: GameplayOptions) -> State {
    let lookahead_seconds = if options.lookahead_seconds.is_finite() {
        options.lookahead_seconds.max(0.0)
    } else {
        DEFAULT_LOOKAHEAD_SECONDS
    };
    let [perfect_ms, good_ms, ok_ms] = options.timing_profile.windows_ms();
    info!(
        "Session '{}' started: difficulty={}, notes={}, windows_ms=[{:.1}, {:.1}, {:.1}]",
        song_id,
        difficulty,
        notes.len(),
        perfect_ms,
        good_ms,
        ok_ms
    );
    let mut spawn_order: Vec<usize> = (0..notes.len()).collect();
    spawn_order.sort_by(|&a, &b| notes[a].timestamp.total_cmp(&notes[b].timestamp));
    State {
        song_id: song_id.to_string(),
        difficulty,
        notes,
        session: SessionState::default(),
        timing_profile: options.timing_profile,
        lookahead_seconds,
        pending_inputs: VecDeque::new(),
        next_pending_cursor: 0,
        spawn_order,
        note_spawn_cursor: 0,
        summary: None,
    }
}

/// Buffers a lane press to be judged on the next `update`, after that
/// tick's miss sweep.
pub fn queue_input_edge(state: &mut State, lane: usize, event_time: f32) {
    if state.is_ended() {
        return;
    }
    debug!("Queued press: lane={lane}, event_time_s={event_time:.4}");
    state.pending_inputs.push_back(InputEdge { lane, event_time });
}

/// Judges a press against the closest unhit note in `lane`. Returns `None`
/// when nothing in that lane is inside the miss window.
pub fn judge_a_tap(state: &mut State, lane: usize, current_time: f32) -> Option<JudgmentResult> {
    if state.is_ended() || lane >= NUM_LANES {
        return None;
    }
    let window = state.timing_profile.miss_window_s();
    let mut best: Option<(usize, f32)> = None;
    for (idx, n) in state
        .notes
        .iter()
        .enumerate()
        .skip(state.next_pending_cursor)
        .filter(|(_, n)| !n.hit && n.lane == lane)
    {
        let abs_err = (n.timestamp - current_time).abs();
        if abs_err <= window {
            // Exact ties keep the earlier note in sequence order.
            match best {
                Some((_, best_err)) if abs_err >= best_err => {}
                _ => best = Some((idx, abs_err)),
            }
        }
    }

    let (note_index, _) = best?;
    let time_error_s = current_time - state.notes[note_index].timestamp;
    let grade = classify_offset_s(time_error_s, &state.timing_profile);
    let time_error_ms = time_error_s * 1000.0;

    let note = &mut state.notes[note_index];
    if !note.mark_judged(Judgment { time_error_ms, grade }) {
        return None;
    }
    let note = note.clone();
    state.session.apply_hit(grade);
    state.advance_pending_cursor();

    info!(
        "HIT: grade={}, id={}, lane={}, note_time_s={:.4}, event_time_s={:.4}, offset_ms={:.2}, streak={}",
        grade.label(),
        note.id,
        lane,
        note.timestamp,
        current_time,
        time_error_ms,
        state.session.streak
    );

    Some(JudgmentResult { lane, grade, time_error_ms, note_index, note })
}

/// Judges one press and reports everything the presentation layer should
/// react to, including streak milestones.
pub fn handle_input(state: &mut State, lane: usize, current_time: f32) -> SmallVec<[GameplayEvent; 2]> {
    let mut events = SmallVec::new();
    if state.is_ended() {
        return events;
    }
    match judge_a_tap(state, lane, current_time) {
        Some(result) => {
            events.push(GameplayEvent::Judged(result));
            let streak = state.session.streak;
            if let Some(message) = streak_milestone_message(streak) {
                events.push(GameplayEvent::Milestone { streak, message });
            }
        }
        None if lane < NUM_LANES => events.push(GameplayEvent::EmptyPress { lane }),
        None => {}
    }
    events
}

/// Marks every unhit note whose window has fully passed as missed and resets
/// the streak. Returns the notes missed by this call.
pub fn apply_time_based_misses(state: &mut State, music_time_sec: f32) -> Vec<Note> {
    let mut missed = Vec::new();
    if state.is_ended() {
        return missed;
    }
    let window = state.timing_profile.miss_window_s();
    let start = state.next_pending_cursor;
    for note in state.notes[start..].iter_mut() {
        if note.hit || music_time_sec <= note.timestamp + window {
            continue;
        }
        let time_error_ms = (music_time_sec - note.timestamp) * 1000.0;
        if note.mark_judged(Judgment { time_error_ms, grade: JudgeGrade::Miss }) {
            info!(
                "MISS: id={}, lane={}, note_time_s={:.4}, miss_time_s={:.4}",
                note.id, note.lane, note.timestamp, music_time_sec
            );
            missed.push(note.clone());
        }
    }
    if !missed.is_empty() {
        state.session.apply_miss();
        state.advance_pending_cursor();
    }
    missed
}

// Notes are announced in timestamp order once their lookahead opens. Notes
// judged before they came into view are passed over silently.
fn spawn_lookahead_notes(state: &mut State, music_time_sec: f32, events: &mut GameplayEvents) {
    let lookahead_time = music_time_sec + state.lookahead_seconds;
    let mut cursor = state.note_spawn_cursor;
    while let Some(&idx) = state.spawn_order.get(cursor) {
        let note = &state.notes[idx];
        if note.timestamp > lookahead_time {
            break;
        }
        cursor += 1;
        if note.hit {
            continue;
        }
        debug!("Spawned note {} in lane {}", note.id, note.lane);
        events.push(GameplayEvent::NoteSpawned { note_index: idx, lane: note.lane });
    }
    state.note_spawn_cursor = cursor;
}

/// One scheduling tick: announce newly visible notes, sweep expired ones,
/// then judge every press queued since the last tick.
pub fn update(state: &mut State, music_time_sec: f32) -> GameplayEvents {
    let mut events = GameplayEvents::new();
    if state.is_ended() {
        return events;
    }

    spawn_lookahead_notes(state, music_time_sec, &mut events);
    for note in apply_time_based_misses(state, music_time_sec) {
        events.push(GameplayEvent::Missed(note));
    }

    while let Some(edge) = state.pending_inputs.pop_front() {
        events.extend(handle_input(state, edge.lane, edge.event_time));
    }
    events
}

/// Ticks from a clock and closes the session once playback reports it has
/// ended.
pub fn update_from_clock(state: &mut State, clock: &dyn TimeSource) -> GameplayEvents {
    let mut events = update(state, clock.current_time());
    if clock.has_ended() && !state.is_ended() {
        let summary = end_session(state);
        events.push(GameplayEvent::SessionEnded(Box::new(summary)));
    }
    events
}

/// Closes the session. Later judge, sweep and update calls do nothing.
/// Calling this again returns the first summary.
pub fn end_session(state: &mut State) -> StageSummary {
    if let Some(summary) = state.summary.as_ref() {
        return summary.clone();
    }
    state.pending_inputs.clear();
    let summary = StageSummary::build(&state.song_id, state.difficulty, &state.session, &state.notes);
    info!(
        "Session '{}' ended: grade={}, score={}, hits={}/{}, max_streak={}",
        summary.song_id,
        summary.grade,
        summary.score,
        summary.hit_count,
        summary.total_notes,
        summary.max_streak
    );
    state.summary = Some(summary.clone());
    summary
}

/// Replays the same notes from the top.
pub fn restart(state: &mut State) {
    for note in &mut state.notes {
        note.reset();
    }
    state.session = SessionState::default();
    state.pending_inputs.clear();
    state.next_pending_cursor = 0;
    state.note_spawn_cursor = 0;
    state.summary = None;
    info!("Session '{}' restarted", state.song_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::game::chart;
    use crate::game::note::{LyricLine, TimedWord, TimingTrack};
    use crate::game::scores::Grade;

    fn note(id: &str, timestamp: f32, lane: usize) -> Note {
        Note {
            id: id.to_string(),
            text: id.to_string(),
            translation: id.to_string(),
            timestamp,
            duration: 0.2,
            lane,
            hit: false,
            result: None,
        }
    }

    fn state_with(notes: Vec<Note>) -> State {
        init("test", Difficulty::MAX, notes, GameplayOptions::default())
    }

    fn one_line_track(times: &[f32]) -> TimingTrack {
        TimingTrack {
            lines: vec![LyricLine {
                words: times
                    .iter()
                    .enumerate()
                    .map(|(i, &t)| TimedWord { text: format!("w{i}"), timestamp: t, duration: 0.3 })
                    .collect(),
            }],
        }
    }

    #[test]
    fn four_word_scenario() {
        let notes = chart::generate(&one_line_track(&[1.0, 1.0, 2.0, 2.0]), Difficulty::MAX);
        let lanes: Vec<usize> = notes.iter().map(|n| n.lane).collect();
        assert_eq!(lanes, vec![0, 1, 2, 3]);

        let mut state = state_with(notes);
        let result = judge_a_tap(&mut state, 0, 1.02).expect("lane 0 should have a candidate");
        assert_eq!(result.grade, JudgeGrade::Perfect);
        assert_eq!(result.note.id, "0-0");
        assert_eq!(result.lane, 0);
        assert_eq!(state.session.score, 25);
        assert_eq!(state.session.streak, 1);
        assert_eq!(state.session.hit_count, 1);
        assert!(state.notes[0].hit);
        assert!(!state.notes[1].hit, "other lanes must be untouched");
    }

    #[test]
    fn nearest_note_wins() {
        let mut state = state_with(vec![note("a", 1.0, 0), note("b", 1.05, 0)]);
        let result = judge_a_tap(&mut state, 0, 1.03).unwrap();
        assert_eq!(result.note.id, "b");
        assert!(!state.notes[0].hit);
        assert!(state.notes[1].hit);
    }

    #[test]
    fn exact_tie_keeps_sequence_order() {
        let mut state = state_with(vec![note("a", 1.0, 2), note("b", 1.5, 2)]);
        let result = judge_a_tap(&mut state, 2, 1.25).unwrap();
        assert_eq!(result.note.id, "a");
    }

    #[test]
    fn tiers_by_offset() {
        let mut state = state_with(vec![
            note("p", 1.0, 0),
            note("g", 3.0, 0),
            note("o", 5.0, 0),
        ]);
        assert_eq!(judge_a_tap(&mut state, 0, 0.95).unwrap().grade, JudgeGrade::Perfect);
        assert_eq!(judge_a_tap(&mut state, 0, 3.12).unwrap().grade, JudgeGrade::Good);
        assert_eq!(judge_a_tap(&mut state, 0, 4.8).unwrap().grade, JudgeGrade::Ok);
        // Flat scoring for every tier.
        assert_eq!(state.session.score, 75);
        assert_eq!(state.session.max_streak, 3);
    }

    #[test]
    fn out_of_window_is_never_selected() {
        let mut state = state_with(vec![note("a", 1.0, 1)]);
        assert!(judge_a_tap(&mut state, 1, 1.3).is_none());
        assert!(judge_a_tap(&mut state, 1, 0.7).is_none());
        assert!(!state.notes[0].hit);
        assert_eq!(state.session, SessionState::default());
    }

    #[test]
    fn judged_offsets_stay_inside_miss_window() {
        let notes: Vec<Note> = (0..40)
            .map(|i| note(&format!("n{i}"), 0.5 + i as f32 * 0.13, i % 4))
            .collect();
        let mut state = state_with(notes);
        let mut t = 0.0;
        while t < 6.5 {
            for lane in 0..NUM_LANES {
                if let Some(r) = judge_a_tap(&mut state, lane, t) {
                    assert!(r.time_error_ms.abs() <= 250.0 + 1e-3, "judged at {} ms", r.time_error_ms);
                }
            }
            t += 0.037;
        }
    }

    #[test]
    fn same_lane_double_press_claims_once() {
        let mut state = state_with(vec![note("a", 1.0, 3)]);
        assert!(judge_a_tap(&mut state, 3, 1.0).is_some());
        assert!(judge_a_tap(&mut state, 3, 1.01).is_none());
        assert_eq!(state.session.hit_count, 1);
    }

    #[test]
    fn lanes_do_not_interfere() {
        let mut state = state_with(vec![note("a", 1.0, 0), note("b", 1.0, 1)]);
        let a = judge_a_tap(&mut state, 0, 1.0).unwrap();
        let b = judge_a_tap(&mut state, 1, 1.0).unwrap();
        assert_eq!((a.note.id.as_str(), b.note.id.as_str()), ("a", "b"));
        assert_eq!(state.session.streak, 2);
    }

    #[test]
    fn invalid_lane_is_a_no_op() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        assert!(judge_a_tap(&mut state, 4, 1.0).is_none());
        assert!(handle_input(&mut state, 9, 1.0).is_empty());
    }

    #[test]
    fn sweep_misses_and_resets_streak() {
        let mut state = state_with(vec![note("a", 1.0, 0), note("b", 2.0, 1)]);
        judge_a_tap(&mut state, 0, 1.0).unwrap();
        assert_eq!(state.session.streak, 1);

        let missed = apply_time_based_misses(&mut state, 2.0 + 0.26);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, "b");
        assert_eq!(missed[0].result.as_ref().map(|j| j.grade), Some(JudgeGrade::Miss));
        assert!(state.notes[1].hit);
        assert_eq!(state.session.streak, 0);
        assert_eq!(state.session.score, 25);
        assert_eq!(state.session.max_streak, 1);
    }

    #[test]
    fn sweep_is_idempotent() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        assert_eq!(apply_time_based_misses(&mut state, 1.3).len(), 1);
        state.session.streak = 4; // A later hit would have rebuilt the streak.
        assert!(apply_time_based_misses(&mut state, 1.3).is_empty());
        assert_eq!(state.session.streak, 4);
    }

    #[test]
    fn sweep_waits_for_the_whole_window() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        assert!(apply_time_based_misses(&mut state, 1.2).is_empty());
        assert!(!state.notes[0].hit);
    }

    #[test]
    fn window_edge_is_still_judgeable() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        assert!(apply_time_based_misses(&mut state, 1.25).is_empty());
        let result = judge_a_tap(&mut state, 0, 1.25).expect("edge of the window is in range");
        assert_eq!(result.grade, JudgeGrade::Ok);
        assert!((result.time_error_ms - 250.0).abs() < 1e-3);
    }

    #[test]
    fn sweep_handles_unsorted_timestamps() {
        let mut state = state_with(vec![note("late", 5.0, 0), note("early", 1.0, 1)]);
        let missed = apply_time_based_misses(&mut state, 2.0);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, "early");
        assert!(!state.notes[0].hit);
    }

    #[test]
    fn update_sweeps_before_judging_queued_presses() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        // The press itself is within 0.25 s, but the tick it lands in has
        // already expired the note.
        queue_input_edge(&mut state, 0, 1.24);
        let events = update(&mut state, 1.3);
        assert!(events.iter().any(|e| matches!(e, GameplayEvent::Missed(n) if n.id == "a")));
        assert!(events.iter().any(|e| matches!(e, GameplayEvent::EmptyPress { lane: 0 })));
        assert_eq!(state.session.hit_count, 0);
    }

    #[test]
    fn update_judges_queued_presses_with_event_time() {
        let mut state = state_with(vec![note("a", 1.0, 2)]);
        queue_input_edge(&mut state, 2, 1.01);
        let events = update(&mut state, 1.05);
        let judged: Vec<&JudgmentResult> = events
            .iter()
            .filter_map(|e| match e {
                GameplayEvent::Judged(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(judged.len(), 1);
        assert!((judged[0].time_error_ms - 10.0).abs() < 0.5);
    }

    #[test]
    fn lookahead_spawns_each_note_once() {
        let mut state = init(
            "test",
            Difficulty::MAX,
            vec![note("a", 2.0, 0), note("b", 4.0, 1)],
            GameplayOptions { lookahead_seconds: 1.5, ..Default::default() },
        );
        let spawned = |events: &GameplayEvents| -> Vec<usize> {
            events
                .iter()
                .filter_map(|e| match e {
                    GameplayEvent::NoteSpawned { note_index, .. } => Some(*note_index),
                    _ => None,
                })
                .collect()
        };
        assert!(spawned(&update(&mut state, 0.0)).is_empty());
        assert_eq!(spawned(&update(&mut state, 0.6)), vec![0]);
        assert!(spawned(&update(&mut state, 0.7)).is_empty());
        assert_eq!(spawned(&update(&mut state, 2.5)), vec![1]);
    }

    #[test]
    fn overlapping_lines_spawn_by_timestamp() {
        // Line 1 starts before line 0 ends.
        let mut state = state_with(vec![note("0-0", 5.0, 0), note("1-0", 1.0, 1)]);
        let mut seen = Vec::new();
        let mut t = 0.0;
        while t <= 3.0 {
            for event in update(&mut state, t) {
                match event {
                    GameplayEvent::NoteSpawned { note_index, .. } => {
                        seen.push(format!("spawn:{}", state.notes[note_index].id));
                    }
                    GameplayEvent::Missed(n) => seen.push(format!("miss:{}", n.id)),
                    _ => {}
                }
            }
            t += 0.5;
        }
        assert_eq!(seen, vec!["spawn:1-0", "miss:1-0", "spawn:0-0"]);
    }

    #[test]
    fn judged_notes_are_never_announced() {
        let mut state = init(
            "test",
            Difficulty::MAX,
            vec![note("a", 1.0, 0), note("b", 2.0, 1)],
            GameplayOptions { lookahead_seconds: 0.0, ..Default::default() },
        );
        queue_input_edge(&mut state, 0, 0.85);
        let first = update(&mut state, 0.9);
        assert!(first.iter().any(|e| matches!(e, GameplayEvent::Judged(r) if r.note.id == "a")));
        assert!(first.iter().all(|e| !matches!(e, GameplayEvent::NoteSpawned { .. })));
        assert!(update(&mut state, 1.0).is_empty());

        // A note that expires inside one tick is shown before it is missed.
        let events = update(&mut state, 2.5);
        assert!(matches!(events[0], GameplayEvent::NoteSpawned { note_index: 1, .. }));
        assert!(matches!(&events[1], GameplayEvent::Missed(n) if n.id == "b"));
    }

    #[test]
    fn restart_announces_notes_again() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        assert_eq!(update(&mut state, 0.0).len(), 1);
        restart(&mut state);
        assert!(matches!(
            update(&mut state, 0.0).as_slice(),
            [GameplayEvent::NoteSpawned { note_index: 0, lane: 0 }]
        ));
    }

    #[test]
    fn milestone_fires_on_third_hit() {
        let mut state = state_with(vec![note("a", 1.0, 0), note("b", 2.0, 0), note("c", 3.0, 0)]);
        handle_input(&mut state, 0, 1.0);
        handle_input(&mut state, 0, 2.0);
        let events = handle_input(&mut state, 0, 3.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameplayEvent::Milestone { streak: 3, .. })));
    }

    #[test]
    fn empty_session_is_harmless() {
        let mut state = state_with(Vec::new());
        assert!(judge_a_tap(&mut state, 0, 1.0).is_none());
        assert!(apply_time_based_misses(&mut state, 10.0).is_empty());
        let summary = end_session(&mut state);
        assert_eq!(summary.grade, Grade::F);
        assert_eq!(summary.total_notes, 0);
    }

    #[test]
    fn ended_session_ignores_everything() {
        let mut state = state_with(vec![note("a", 1.0, 0), note("b", 2.0, 0)]);
        judge_a_tap(&mut state, 0, 1.0).unwrap();
        let first = end_session(&mut state);
        assert!(judge_a_tap(&mut state, 0, 2.0).is_none());
        assert!(apply_time_based_misses(&mut state, 9.0).is_empty());
        queue_input_edge(&mut state, 0, 2.0);
        assert!(update(&mut state, 2.0).is_empty());
        let again = end_session(&mut state);
        assert_eq!(again.score, first.score);
        assert_eq!(again.hit_count, 1);
        assert_eq!(state.session.streak, 1);
    }

    #[test]
    fn restart_clears_progress() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        judge_a_tap(&mut state, 0, 1.0).unwrap();
        end_session(&mut state);
        restart(&mut state);
        assert!(!state.is_ended());
        assert!(state.notes.iter().all(|n| !n.hit && n.result.is_none()));
        assert_eq!(state.session, SessionState::default());
        assert!(judge_a_tap(&mut state, 0, 1.0).is_some());
    }

    #[test]
    fn clock_end_closes_the_session() {
        let mut state = state_with(vec![note("a", 1.0, 0)]);
        let clock = ManualClock::new();
        clock.set(0.5);
        let early = update_from_clock(&mut state, &clock);
        assert!(early.iter().all(|e| !matches!(e, GameplayEvent::SessionEnded(_))));
        clock.set(2.0);
        clock.finish();
        let events = update_from_clock(&mut state, &clock);
        let ended = events.iter().find_map(|e| match e {
            GameplayEvent::SessionEnded(s) => Some(s),
            _ => None,
        });
        let summary = ended.expect("session should end with the clock");
        assert_eq!(summary.window_counts.miss, 1);
        assert!(state.is_ended());
    }
}
