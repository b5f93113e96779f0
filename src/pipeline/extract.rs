//! Line/record extraction: page text → [`AttemptRecord`]s.
//!
//! Each line is scanned for at most one subject code. Marks, the P/F verdict
//! and letter grades are read from the text *after* the code; serial numbers
//! and page furniture before it are ignored. Lines that carry a code but no
//! usable marks are headers, footers or watermark debris and are skipped
//! without error.
//!
//! ## Marks disambiguation
//!
//! Layouts print internal, external and total marks in varying column
//! orders. [`MarksPolicy::Maximum`] picks the largest plausible number;
//! [`MarksPolicy::Columnar`] reads one number as the total, two as
//! internal + external, and three or more as `…, total`.

use crate::config::MarksPolicy;
use crate::error::Pdf2GpaError;
use crate::scheme::GradingScheme;
use crate::subject::{AttemptRecord, Marks, PassFail, SubjectCode};
use once_cell::sync::Lazy;
use regex::Regex;

/// Largest number accepted as marks.
pub const MAX_PLAUSIBLE_MARKS: u16 = 200;

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,3}\b").unwrap());

const PASS_TOKENS: &[&str] = &["P", "PASS", "PASSED"];
const FAIL_TOKENS: &[&str] = &["F", "FAIL", "FAILED"];

/// Extracts attempt records from one page of text at a time.
///
/// Extraction is pure: calling [`RecordExtractor::extract`] twice on the
/// same text yields identical sequences.
#[derive(Debug, Clone)]
pub struct RecordExtractor<'s> {
    scheme: &'s GradingScheme,
    code_re: Regex,
    policy: MarksPolicy,
}

impl<'s> RecordExtractor<'s> {
    pub fn new(scheme: &'s GradingScheme, policy: MarksPolicy) -> Result<Self, Pdf2GpaError> {
        let code_re = Regex::new(&scheme.code_pattern).map_err(|e| Pdf2GpaError::InvalidScheme {
            name: scheme.name.clone(),
            reason: format!("code pattern does not compile: {e}"),
        })?;
        Ok(Self {
            scheme,
            code_re,
            policy,
        })
    }

    /// Lazily extract records from a page, in line order.
    pub fn extract<'a>(&'a self, page_text: &'a str) -> impl Iterator<Item = AttemptRecord> + 'a {
        page_text
            .lines()
            .enumerate()
            .filter_map(move |(idx, line)| self.extract_line(line, idx + 1))
    }

    /// Extract the record carried by a single line, if any.
    pub fn extract_line(&self, line: &str, line_no: usize) -> Option<AttemptRecord> {
        let found = self.code_re.find(line)?;
        let code = SubjectCode::new(found.as_str());
        let tail = &line[found.end()..];
        let verdict = explicit_verdict(tail);

        let numbers: Vec<u16> = RE_NUMBER
            .find_iter(tail)
            .filter_map(|m| m.as_str().parse::<u16>().ok())
            .filter(|&n| n <= MAX_PLAUSIBLE_MARKS)
            .collect();

        let (marks, pass_fail) = match self.policy.select(&numbers) {
            Some(raw) => {
                let percentage = self.percentage(&code, raw);
                let pass_fail = verdict.unwrap_or(if percentage < self.scheme.pass_percentage {
                    PassFail::Fail
                } else {
                    PassFail::Pass
                });
                (Marks::Numeric { raw, percentage }, pass_fail)
            }
            None if numbers.is_empty() => {
                let verdict = verdict?;
                let letter = self.trailing_letter_grade(tail)?;
                (Marks::Letter { letter }, verdict)
            }
            None => return None,
        };

        Some(AttemptRecord {
            semester: code.semester(),
            code,
            marks,
            pass_fail,
            line: line_no,
        })
    }

    /// Rescale printed marks to a 100-point basis.
    ///
    /// A scheme denominator for the code wins, then the maximum marks of the
    /// first credit rule matching the code. Otherwise totals above 100 are
    /// taken to be out of 200 and halved.
    pub fn percentage(&self, code: &SubjectCode, raw: u16) -> f64 {
        let max = self.scheme.denominators.get(code.as_str()).copied().or_else(|| {
            self.scheme
                .credit_rules
                .iter()
                .find(|rule| rule.matches(code))
                .and_then(|rule| rule.max_marks())
        });
        let pct = match max {
            Some(max) => f64::from(raw) * 100.0 / f64::from(max),
            None if raw > 100 => f64::from(raw) / 2.0,
            None => f64::from(raw),
        };
        pct.min(100.0)
    }

    /// Letter-grade-only rows print `… <grade> <P|F>`: the token before the
    /// trailing verdict must be a ladder letter.
    fn trailing_letter_grade(&self, tail: &str) -> Option<String> {
        let tokens = tokens(tail);
        let (last, rest) = tokens.split_last()?;
        if !is_verdict(last) {
            return None;
        }
        let candidate = rest.last()?;
        self.scheme
            .grade_ladder
            .letters()
            .find(|letter| letter == candidate)
            .map(str::to_string)
    }
}

impl MarksPolicy {
    /// Choose the total from the plausible numbers printed after a code.
    pub fn select(self, numbers: &[u16]) -> Option<u16> {
        let total = match self {
            MarksPolicy::Maximum => numbers.iter().copied().max(),
            MarksPolicy::Columnar => match numbers {
                [] => None,
                [total] => Some(*total),
                [internal, external] => Some(internal + external),
                [.., total] => Some(*total),
            },
        }?;
        (total <= MAX_PLAUSIBLE_MARKS).then_some(total)
    }
}

fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, '|' | ',' | ';' | ':'))
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_verdict(token: &str) -> bool {
    let upper = token.to_ascii_uppercase();
    PASS_TOKENS.contains(&upper.as_str()) || FAIL_TOKENS.contains(&upper.as_str())
}

/// A standalone P/PASS or F/FAIL token among the marks columns. Any fail
/// token wins over a pass token.
///
/// Only text from the first number onwards is read, so words in the subject
/// name never count. Without numbers only the last token is read.
fn explicit_verdict(tail: &str) -> Option<PassFail> {
    let columns = match RE_NUMBER.find(tail) {
        Some(first) => tokens(&tail[first.start()..]),
        None => tokens(tail).last().copied().into_iter().collect(),
    };
    let mut verdict = None;
    for token in columns {
        let upper = token.to_ascii_uppercase();
        if FAIL_TOKENS.contains(&upper.as_str()) {
            return Some(PassFail::Fail);
        }
        if PASS_TOKENS.contains(&upper.as_str()) {
            verdict = Some(PassFail::Pass);
        }
    }
    verdict
}
