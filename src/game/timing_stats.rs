use crate::game::judgment::JudgeGrade;
use crate::game::note::Note;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowCounts {
    pub perfect: u32,
    pub good: u32,
    pub ok: u32,
    pub miss: u32,
}

impl WindowCounts {
    #[inline(always)]
    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.ok + self.miss
    }
}

#[inline(always)]
pub fn compute_window_counts(notes: &[Note]) -> WindowCounts {
    let mut out = WindowCounts::default();
    for n in notes {
        let Some(j) = n.result.as_ref() else { continue; };
        match j.grade {
            JudgeGrade::Perfect => out.perfect = out.perfect.saturating_add(1),
            JudgeGrade::Good => out.good = out.good.saturating_add(1),
            JudgeGrade::Ok => out.ok = out.ok.saturating_add(1),
            JudgeGrade::Miss => out.miss = out.miss.saturating_add(1),
        }
    }
    out
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TimingStats {
    pub mean_abs_ms: f32,
    pub mean_ms: f32,
    pub stddev_ms: f32,
    pub max_abs_ms: f32,
    pub count: usize,
}

/// Offsets of every non-miss judgment. Negative means early.
pub fn hit_offsets_ms(notes: &[Note]) -> impl Iterator<Item = f32> + '_ {
    notes
        .iter()
        .filter_map(|n| n.result.as_ref())
        .filter(|j| j.grade != JudgeGrade::Miss)
        .map(|j| j.time_error_ms)
}

#[inline(always)]
pub fn compute_note_timing_stats(notes: &[Note]) -> TimingStats {
    // First pass: sums and maxima
    let mut sum_abs = 0.0_f32;
    let mut sum_signed = 0.0_f32;
    let mut max_abs = 0.0_f32;
    let mut count: usize = 0;

    for e in hit_offsets_ms(notes) {
        let a = e.abs();
        sum_abs += a;
        sum_signed += e;
        if a > max_abs { max_abs = a; }
        count += 1;
    }

    if count == 0 {
        return TimingStats::default();
    }

    let mean_ms = sum_signed / (count as f32);
    let mean_abs_ms = sum_abs / (count as f32);

    // Second pass: sample standard deviation of signed offsets
    let stddev_ms = if count > 1 {
        let sum_diff_sq: f32 = hit_offsets_ms(notes)
            .map(|e| {
                let d = e - mean_ms;
                d * d
            })
            .sum();
        (sum_diff_sq / ((count as f32) - 1.0)).sqrt()
    } else { 0.0 };

    TimingStats { mean_abs_ms, mean_ms, stddev_ms, max_abs_ms: max_abs, count }
}
