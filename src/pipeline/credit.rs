//! Credit resolver: subject code → credit weight and semester.
//!
//! Lookup is table-first. Codes missing from the scheme's table fall through
//! an ordered list of [`CreditRule`]s and finally the scheme default, so
//! resolution never fails. Every fallback is tagged on the result as
//! [`CreditSource::Fallback`] so callers can audit a stale table.

use crate::scheme::GradingScheme;
use crate::subject::SubjectCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One heuristic for codes absent from the credit table.
///
/// Rules are evaluated in the order the scheme lists them; the first match
/// wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CreditRule {
    /// Major project / internship: the numeric segment is one of `segments`.
    /// Such subjects may be marked out of `max_marks` instead of 100.
    Project {
        segments: Vec<String>,
        credits: u32,
        #[serde(default)]
        max_marks: Option<u16>,
    },
    /// Lab / AEC / UHV style courses: the last two digits are one of
    /// `endings` (a trailing disambiguator letter is allowed), or the letter
    /// prefix ends in `marker`.
    Lab {
        endings: Vec<String>,
        #[serde(default)]
        marker: Option<char>,
        credits: u32,
    },
    /// The two digits after the semester digit equal `position`
    /// (`02` is the second core subject of a semester).
    CorePosition { position: String, credits: u32 },
}

impl CreditRule {
    pub fn kind(&self) -> CreditRuleKind {
        match self {
            CreditRule::Project { .. } => CreditRuleKind::Project,
            CreditRule::Lab { .. } => CreditRuleKind::Lab,
            CreditRule::CorePosition { .. } => CreditRuleKind::CorePosition,
        }
    }

    pub fn credits(&self) -> u32 {
        match self {
            CreditRule::Project { credits, .. }
            | CreditRule::Lab { credits, .. }
            | CreditRule::CorePosition { credits, .. } => *credits,
        }
    }

    /// Maximum marks for subjects this rule matches, when not 100.
    pub fn max_marks(&self) -> Option<u16> {
        match self {
            CreditRule::Project { max_marks, .. } => *max_marks,
            _ => None,
        }
    }

    pub fn matches(&self, code: &SubjectCode) -> bool {
        let digits = code.digits();
        match self {
            CreditRule::Project { segments, .. } => segments.iter().any(|s| s == digits),
            CreditRule::Lab {
                endings, marker, ..
            } => {
                let ending = digits.len() >= 2 && {
                    let last_two = &digits[digits.len() - 2..];
                    let suffix_ok = code.suffix().len() <= 1
                        && code.suffix().chars().all(|c| c.is_ascii_alphabetic());
                    suffix_ok && endings.iter().any(|e| e == last_two)
                };
                let lab_marker = marker
                    .map(|m| code.prefix().ends_with(m.to_ascii_uppercase()))
                    .unwrap_or(false);
                ending || lab_marker
            }
            CreditRule::CorePosition { position, .. } => {
                digits.len() >= 3 && &digits[1..3] == position.as_str()
            }
        }
    }

    /// The rule set used by the built-in VTU schemes.
    pub fn vtu_defaults() -> Vec<CreditRule> {
        vec![
            CreditRule::Project {
                segments: vec!["803".into()],
                credits: 8,
                max_marks: Some(200),
            },
            CreditRule::Lab {
                endings: ["06", "07", "08", "09", "58", "59"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                marker: Some('L'),
                credits: 1,
            },
            CreditRule::CorePosition {
                position: "02".into(),
                credits: 4,
            },
        ]
    }
}

/// Which fallback produced a credit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRuleKind {
    Project,
    Lab,
    CorePosition,
    /// No rule matched; the scheme's default credit applied.
    Default,
}

impl fmt::Display for CreditRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CreditRuleKind::Project => "project",
            CreditRuleKind::Lab => "lab",
            CreditRuleKind::CorePosition => "core-position",
            CreditRuleKind::Default => "default",
        })
    }
}

/// Where a subject's credit value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "rule", rename_all = "snake_case")]
pub enum CreditSource {
    /// The scheme's credit table listed the code.
    Table,
    /// The code was unrecognised and a heuristic supplied the value.
    Fallback(CreditRuleKind),
}

impl CreditSource {
    pub fn is_fallback(self) -> bool {
        matches!(self, CreditSource::Fallback(_))
    }
}

/// The outcome of resolving one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub credits: u32,
    pub semester: u8,
    pub source: CreditSource,
}

/// Resolves codes against one scheme's table and rules.
#[derive(Debug, Clone, Copy)]
pub struct CreditResolver<'s> {
    scheme: &'s GradingScheme,
}

impl<'s> CreditResolver<'s> {
    pub fn new(scheme: &'s GradingScheme) -> Self {
        Self { scheme }
    }

    /// Resolve a code. Deterministic and total.
    pub fn resolve(&self, code: &SubjectCode) -> Resolution {
        let semester = code.semester();

        if let Some(&credits) = self.scheme.credit_table.get(code.as_str()) {
            return Resolution {
                credits,
                semester,
                source: CreditSource::Table,
            };
        }

        let (credits, kind) = self
            .scheme
            .credit_rules
            .iter()
            .find(|rule| rule.matches(code))
            .map(|rule| (rule.credits(), rule.kind()))
            .unwrap_or((self.scheme.default_credits, CreditRuleKind::Default));

        debug!(
            "Credit table has no entry for {}; {} rule assigned {} credits",
            code, kind, credits
        );

        Resolution {
            credits,
            semester,
            source: CreditSource::Fallback(kind),
        }
    }
}
