//! Result types: graded subjects, semester summaries and batch output.

use crate::error::PageError;
use crate::pipeline::credit::CreditSource;
use crate::pipeline::identity::StudentIdentifier;
use crate::pipeline::input::DocumentKind;
use crate::subject::{Marks, PassFail, SubjectCode};
use serde::{Deserialize, Serialize};

/// One graded subject. After reduction there is exactly one per code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub code: SubjectCode,
    pub marks: Marks,
    pub pass_fail: PassFail,
    pub letter_grade: String,
    pub grade_point: u32,
    pub credits: u32,
    /// Table lookup or heuristic fallback.
    pub credit_source: CreditSource,
    pub semester: u8,
}

impl SubjectRecord {
    /// `grade_point × credits`.
    pub fn earned_points(&self) -> u32 {
        self.grade_point * self.credits
    }
}

/// Credit-weighted result of one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterSummary {
    pub semester: u8,
    pub total_credits: u32,
    pub earned_grade_points: u32,
    /// `earned_grade_points / total_credits`, rounded half-up to 2 places.
    pub sgpa: f64,
    /// Subjects in the order they were first resolved.
    pub subjects: Vec<SubjectRecord>,
}

/// The terminal output of the grading core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Σ earned / Σ credits over every retained subject, rounded half-up.
    pub cgpa: f64,
    pub total_credits: u32,
    pub earned_grade_points: u32,
    /// Ordered by ascending semester number.
    pub semesters: Vec<SemesterSummary>,
}

impl TranscriptResult {
    pub fn subjects(&self) -> impl Iterator<Item = &SubjectRecord> {
        self.semesters.iter().flat_map(|s| s.subjects.iter())
    }

    pub fn subject(&self, code: &str) -> Option<&SubjectRecord> {
        self.subjects().find(|s| s.code.as_str() == code)
    }

    pub fn semester(&self, number: u8) -> Option<&SemesterSummary> {
        self.semesters.iter().find(|s| s.semester == number)
    }

    pub fn subject_count(&self) -> usize {
        self.semesters.iter().map(|s| s.subjects.len()).sum()
    }

    /// Codes whose credits came from a heuristic rather than the scheme
    /// table. A non-empty list means the table is missing entries.
    pub fn fallback_codes(&self) -> Vec<&SubjectCode> {
        self.subjects()
            .filter(|s| s.credit_source.is_fallback())
            .map(|s| &s.code)
            .collect()
    }
}

/// What was read from one input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// The path or URL as supplied.
    pub source: String,
    pub kind: DocumentKind,
    pub pages: usize,
    /// Attempt records extracted (before reduction).
    pub attempts: usize,
    /// First identifier seen in this document.
    pub identifier: Option<StudentIdentifier>,
    /// Pages whose text could not be read; they were treated as empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_errors: Vec<PageError>,
}

/// Batch-level statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpaStats {
    pub documents: usize,
    pub pages: usize,
    pub attempts: usize,
    pub subjects: usize,
    pub fallback_credit_subjects: usize,
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything [`crate::compute::compute`] returns on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpaOutput {
    pub transcript: TranscriptResult,
    /// The batch's locked student identifier, if any page carried one.
    pub identifier: Option<StudentIdentifier>,
    /// Grading scheme name.
    pub scheme: String,
    pub documents: Vec<DocumentReport>,
    pub stats: GpaStats,
}
