use std::fmt;

// --- Grade Definitions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    APlus, A, AMinus,
    BPlus, B, BMinus,
    CPlus, C, CMinus,
    DPlus, D, DMinus,
    F,
}

impl Grade {
    pub const fn letter(self) -> &'static str {
        match self {
            Grade::APlus => "A+", Grade::A => "A", Grade::AMinus => "A-",
            Grade::BPlus => "B+", Grade::B => "B", Grade::BMinus => "B-",
            Grade::CPlus => "C+", Grade::C => "C", Grade::CMinus => "C-",
            Grade::DPlus => "D+", Grade::D => "D", Grade::DMinus => "D-",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

// Minimum hit percentage for each grade, best first.
const GRADE_THRESHOLDS: [(u64, Grade); 12] = [
    (97, Grade::APlus),
    (93, Grade::A),
    (90, Grade::AMinus),
    (87, Grade::BPlus),
    (83, Grade::B),
    (80, Grade::BMinus),
    (77, Grade::CPlus),
    (73, Grade::C),
    (70, Grade::CMinus),
    (67, Grade::DPlus),
    (63, Grade::D),
    (60, Grade::DMinus),
];

/// Hit ratio as a 0.0-100.0 percentage; 0 when there were no notes.
pub fn hit_percent(hit_count: u32, total_notes: usize) -> f64 {
    if total_notes == 0 {
        return 0.0;
    }
    (hit_count as f64 / total_notes as f64) * 100.0
}

/// Letter grade from the share of notes hit. Compared in integers so a
/// boundary like 93/100 lands exactly on its grade.
pub fn score_to_grade(hit_count: u32, total_notes: usize) -> Grade {
    if total_notes == 0 {
        return Grade::F;
    }
    let hits = hit_count as u64 * 100;
    let total = total_notes as u64;
    GRADE_THRESHOLDS
        .iter()
        .find(|(pct, _)| hits >= pct * total)
        .map_or(Grade::F, |&(_, grade)| grade)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(score_to_grade(93, 100), Grade::A);
        assert_eq!(score_to_grade(90, 100), Grade::AMinus);
        assert_eq!(score_to_grade(97, 100), Grade::APlus);
        assert_eq!(score_to_grade(96, 100), Grade::A);
        assert_eq!(score_to_grade(60, 100), Grade::DMinus);
        assert_eq!(score_to_grade(59, 100), Grade::F);
        assert_eq!(score_to_grade(100, 100), Grade::APlus);
    }

    #[test]
    fn zero_notes_is_f() {
        assert_eq!(score_to_grade(0, 0), Grade::F);
        assert_eq!(hit_percent(0, 0), 0.0);
    }

    #[test]
    fn fractional_percentages() {
        // 28/30 = 93.33%
        assert_eq!(score_to_grade(28, 30), Grade::A);
        // 2/3 = 66.67% falls just short of D+
        assert_eq!(score_to_grade(2, 3), Grade::D);
        assert_eq!(Grade::BMinus.to_string(), "B-");
    }
}
