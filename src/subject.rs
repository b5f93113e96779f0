//! Subject codes and the raw per-line attempt records extracted from pages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semester assigned to codes that carry no usable semester digit.
pub const DEFAULT_SEMESTER: u8 = 1;

/// A subject code such as `BEC302` or `BSCK306B`.
///
/// Layout: a letter prefix, a numeric segment whose first digit is the
/// semester, and an optional trailing letter disambiguator. Construction
/// never fails; malformed codes simply yield empty segments and the
/// default semester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectCode(String);

impl SubjectCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading letters before the numeric segment (`BECL` for `BECL305`).
    pub fn prefix(&self) -> &str {
        let end = self
            .0
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// The first run of digits (`306` for `BSCK306B`). Empty when the code
    /// has no digits.
    pub fn digits(&self) -> &str {
        let rest = &self.0[self.prefix().len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Everything after the numeric segment (`B` for `BSCK306B`).
    pub fn suffix(&self) -> &str {
        &self.0[self.prefix().len() + self.digits().len()..]
    }

    /// Semester number: the first decimal digit of the code.
    ///
    /// Codes with no digit, or whose first digit is `0`, map to
    /// [`DEFAULT_SEMESTER`]; see [`SubjectCode::semester_is_default`].
    pub fn semester(&self) -> u8 {
        match self.first_digit() {
            Some(d) if d > 0 => d,
            _ => DEFAULT_SEMESTER,
        }
    }

    /// `true` when [`SubjectCode::semester`] fell back to the default
    /// instead of reading a digit from the code.
    pub fn semester_is_default(&self) -> bool {
        !matches!(self.first_digit(), Some(d) if d > 0)
    }

    fn first_digit(&self) -> Option<u8> {
        self.0
            .chars()
            .find_map(|c| c.to_digit(10))
            .map(|d| d as u8)
    }
}

impl fmt::Display for SubjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Pass/fail status of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassFail {
    #[serde(rename = "P")]
    Pass,
    #[serde(rename = "F")]
    Fail,
}

impl PassFail {
    pub fn is_pass(self) -> bool {
        self == PassFail::Pass
    }
}

impl fmt::Display for PassFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassFail::Pass => "P",
            PassFail::Fail => "F",
        })
    }
}

/// The marks printed for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Marks {
    /// A numeric total as printed (0–200) and its 100-point percentage.
    Numeric { raw: u16, percentage: f64 },
    /// A result line that only carries a letter grade.
    Letter { letter: String },
}

impl Marks {
    /// The printed numeric total, if any.
    pub fn raw(&self) -> Option<u16> {
        match self {
            Marks::Numeric { raw, .. } => Some(*raw),
            Marks::Letter { .. } => None,
        }
    }

    /// The rescaled percentage, if marks were printed.
    pub fn percentage(&self) -> Option<f64> {
        match self {
            Marks::Numeric { percentage, .. } => Some(*percentage),
            Marks::Letter { .. } => None,
        }
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marks::Numeric { raw, .. } => write!(f, "{raw}"),
            Marks::Letter { letter } => f.write_str(letter),
        }
    }
}

/// One observed occurrence of a subject on one page.
///
/// Many may exist per code across a batch (repeat attempts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub code: SubjectCode,
    pub marks: Marks,
    pub pass_fail: PassFail,
    /// Semester derived from the code.
    pub semester: u8,
    /// 1-indexed line within the page the record was read from.
    pub line: usize,
}
