//! Aggregation: reduced subjects → semester SGPAs and the overall CGPA.
//!
//! CGPA is the single weighted ratio over every retained subject, never a
//! mean of SGPAs. Grade points and credits are integers, so both ratios are
//! rounded exactly with integer arithmetic.

use crate::error::ExtractionFailure;
use crate::output::{SemesterSummary, SubjectRecord, TranscriptResult};
use crate::subject::SubjectCode;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Build the transcript from the reducer's output.
///
/// Semesters come out ascending; subjects keep the map's insertion order.
pub fn aggregate(
    records: IndexMap<SubjectCode, SubjectRecord>,
) -> Result<TranscriptResult, ExtractionFailure> {
    if records.is_empty() {
        return Err(ExtractionFailure::NoData);
    }

    let mut by_semester: BTreeMap<u8, Vec<SubjectRecord>> = BTreeMap::new();
    for (_, record) in records {
        by_semester.entry(record.semester).or_default().push(record);
    }

    let semesters: Vec<SemesterSummary> = by_semester
        .into_iter()
        .map(|(semester, subjects)| {
            let total_credits: u32 = subjects.iter().map(|s| s.credits).sum();
            let earned_grade_points: u32 = subjects.iter().map(SubjectRecord::earned_points).sum();
            SemesterSummary {
                semester,
                total_credits,
                earned_grade_points,
                sgpa: weighted_average(earned_grade_points, total_credits),
                subjects,
            }
        })
        .collect();

    let total_credits: u32 = semesters.iter().map(|s| s.total_credits).sum();
    let earned_grade_points: u32 = semesters.iter().map(|s| s.earned_grade_points).sum();

    Ok(TranscriptResult {
        cgpa: weighted_average(earned_grade_points, total_credits),
        total_credits,
        earned_grade_points,
        semesters,
    })
}

/// `earned / credits` rounded half-up to two decimal places.
///
/// Zero credits yield `0.0`.
pub fn weighted_average(earned: u32, credits: u32) -> f64 {
    if credits == 0 {
        return 0.0;
    }
    let (earned, credits) = (u64::from(earned), u64::from(credits));
    let hundredths = (earned * 200 + credits) / (credits * 2);
    hundredths as f64 / 100.0
}
