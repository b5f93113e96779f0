//! Grade engine: percentage + pass/fail → letter grade and grade point.
//!
//! The ladder is data, not code. Each [`crate::scheme::GradingScheme`] carries
//! its own [`GradeLadder`], so one engine serves every scheme year.

use crate::subject::PassFail;
use serde::{Deserialize, Serialize};

/// One rung of the ladder: percentages `>= min_percentage` earn `letter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub letter: String,
    pub min_percentage: f64,
    pub points: u32,
}

impl GradeBand {
    pub fn new(letter: impl Into<String>, min_percentage: f64, points: u32) -> Self {
        Self {
            letter: letter.into(),
            min_percentage,
            points,
        }
    }
}

/// The letter grade and grade point awarded for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub letter: String,
    pub points: u32,
}

/// An ordered, descending threshold table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeLadder {
    /// Bands ordered by descending `min_percentage`.
    pub bands: Vec<GradeBand>,
    /// Letter awarded (with zero points) on failure or below the last band.
    #[serde(default = "default_fail_letter")]
    pub fail_letter: String,
}

fn default_fail_letter() -> String {
    "F".to_string()
}

impl GradeLadder {
    pub fn new(bands: Vec<GradeBand>) -> Self {
        Self {
            bands,
            fail_letter: default_fail_letter(),
        }
    }

    /// The VTU ten-point ladder: O, A+, A, B+, B, C, P, F.
    pub fn vtu() -> Self {
        Self::new(vec![
            GradeBand::new("O", 90.0, 10),
            GradeBand::new("A+", 80.0, 9),
            GradeBand::new("A", 70.0, 8),
            GradeBand::new("B+", 60.0, 7),
            GradeBand::new("B", 55.0, 6),
            GradeBand::new("C", 50.0, 5),
            GradeBand::new("P", 40.0, 4),
        ])
    }

    /// Grade a percentage.
    ///
    /// An explicit [`PassFail::Fail`] always yields the fail grade, whatever
    /// the percentage. Percentages outside 0–100 are a caller error and are
    /// graded as-is.
    pub fn grade_of(&self, percentage: f64, pass_fail: PassFail) -> Grade {
        if pass_fail == PassFail::Fail {
            return self.fail();
        }
        self.bands
            .iter()
            .find(|band| percentage >= band.min_percentage)
            .map(|band| Grade {
                letter: band.letter.clone(),
                points: band.points,
            })
            .unwrap_or_else(|| self.fail())
    }

    /// Grade a result line that only printed a letter. Unknown letters
    /// return `None`.
    pub fn grade_for_letter(&self, letter: &str, pass_fail: PassFail) -> Option<Grade> {
        if pass_fail == PassFail::Fail || letter.eq_ignore_ascii_case(&self.fail_letter) {
            return Some(self.fail());
        }
        self.bands
            .iter()
            .find(|band| band.letter.eq_ignore_ascii_case(letter))
            .map(|band| Grade {
                letter: band.letter.clone(),
                points: band.points,
            })
    }

    /// Every letter the ladder can award, fail letter last.
    pub fn letters(&self) -> impl Iterator<Item = &str> {
        self.bands
            .iter()
            .map(|b| b.letter.as_str())
            .chain(std::iter::once(self.fail_letter.as_str()))
    }

    fn fail(&self) -> Grade {
        Grade {
            letter: self.fail_letter.clone(),
            points: 0,
        }
    }

    /// Check the ladder is non-empty, strictly descending in threshold and
    /// non-increasing in points.
    pub fn validate(&self) -> Result<(), String> {
        if self.bands.is_empty() {
            return Err("grade ladder has no bands".into());
        }
        if self.fail_letter.trim().is_empty() {
            return Err("fail letter is empty".into());
        }
        for band in &self.bands {
            if band.letter.trim().is_empty() {
                return Err("grade band with an empty letter".into());
            }
            if !(0.0..=100.0).contains(&band.min_percentage) {
                return Err(format!(
                    "band '{}' threshold {} is outside 0–100",
                    band.letter, band.min_percentage
                ));
            }
        }
        for pair in self.bands.windows(2) {
            let (hi, lo) = (&pair[0], &pair[1]);
            if lo.min_percentage >= hi.min_percentage {
                return Err(format!(
                    "band '{}' ({}) must have a lower threshold than '{}' ({})",
                    lo.letter, lo.min_percentage, hi.letter, hi.min_percentage
                ));
            }
            if lo.points > hi.points {
                return Err(format!(
                    "band '{}' awards more points than the higher band '{}'",
                    lo.letter, hi.letter
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(p: f64) -> (String, u32) {
        let g = GradeLadder::vtu().grade_of(p, PassFail::Pass);
        (g.letter, g.points)
    }

    #[test]
    fn vtu_thresholds() {
        assert_eq!(grade(100.0), ("O".into(), 10));
        assert_eq!(grade(90.0), ("O".into(), 10));
        assert_eq!(grade(89.5), ("A+".into(), 9));
        assert_eq!(grade(80.0), ("A+".into(), 9));
        assert_eq!(grade(70.0), ("A".into(), 8));
        assert_eq!(grade(62.0), ("B+".into(), 7));
        assert_eq!(grade(55.0), ("B".into(), 6));
        assert_eq!(grade(50.0), ("C".into(), 5));
        assert_eq!(grade(40.0), ("P".into(), 4));
        assert_eq!(grade(39.5), ("F".into(), 0));
        assert_eq!(grade(0.0), ("F".into(), 0));
    }

    #[test]
    fn explicit_fail_overrides_percentage() {
        let g = GradeLadder::vtu().grade_of(95.0, PassFail::Fail);
        assert_eq!(g.letter, "F");
        assert_eq!(g.points, 0);
    }

    #[test]
    fn ladder_is_monotonic_above_pass() {
        let ladder = GradeLadder::vtu();
        let mut last = 0;
        for p in 40..=100 {
            let points = ladder.grade_of(p as f64, PassFail::Pass).points;
            assert!(points >= last, "points dropped at {p}%");
            last = points;
        }
    }

    #[test]
    fn letter_lookup() {
        let ladder = GradeLadder::vtu();
        assert_eq!(ladder.grade_for_letter("a+", PassFail::Pass).unwrap().points, 9);
        assert_eq!(ladder.grade_for_letter("F", PassFail::Pass).unwrap().points, 0);
        assert_eq!(ladder.grade_for_letter("O", PassFail::Fail).unwrap().points, 0);
        assert!(ladder.grade_for_letter("Z", PassFail::Pass).is_none());
    }

    #[test]
    fn validate_rejects_unordered_ladder() {
        let ladder = GradeLadder::new(vec![
            GradeBand::new("A", 60.0, 8),
            GradeBand::new("B", 70.0, 7),
        ]);
        assert!(ladder.validate().is_err());

        let inverted = GradeLadder::new(vec![
            GradeBand::new("A", 70.0, 7),
            GradeBand::new("B", 60.0, 8),
        ]);
        assert!(inverted.validate().is_err());

        assert!(GradeLadder::new(vec![]).validate().is_err());
        assert!(GradeLadder::vtu().validate().is_ok());
    }
}
