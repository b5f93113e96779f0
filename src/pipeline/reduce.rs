//! Best-attempt reduction: one record per subject code.
//!
//! Transcripts list every attempt at a backlogged subject. The reducer keeps
//! the best one: the higher grade point wins, then the higher percentage.
//! Letter-grade attempts rank below any numeric attempt with the same grade
//! point. Ties keep the earliest attempt. Subjects keep the position of their
//! first appearance.

use crate::output::SubjectRecord;
use crate::subject::SubjectCode;
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Streaming reducer; the accumulated map is private to one batch.
#[derive(Debug, Default, Clone)]
pub struct BestAttemptReducer {
    best: IndexMap<SubjectCode, SubjectRecord>,
    offered: usize,
}

impl BestAttemptReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one graded attempt. Returns `true` if it is now the retained
    /// attempt for its code.
    pub fn offer(&mut self, attempt: SubjectRecord) -> bool {
        self.offered += 1;
        match self.best.get_mut(&attempt.code) {
            Some(current) => {
                if compare_attempts(&attempt, current) == Ordering::Greater {
                    *current = attempt;
                    true
                } else {
                    false
                }
            }
            None => {
                self.best.insert(attempt.code.clone(), attempt);
                true
            }
        }
    }

    /// Attempts offered so far, including discarded ones.
    pub fn offered(&self) -> usize {
        self.offered
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn finish(self) -> IndexMap<SubjectCode, SubjectRecord> {
        self.best
    }
}

/// Reduce a sequence of graded attempts in one pass.
pub fn reduce(attempts: impl IntoIterator<Item = SubjectRecord>) -> IndexMap<SubjectCode, SubjectRecord> {
    let mut reducer = BestAttemptReducer::new();
    for attempt in attempts {
        reducer.offer(attempt);
    }
    reducer.finish()
}

/// Total order over attempts at the same subject.
fn compare_attempts(a: &SubjectRecord, b: &SubjectRecord) -> Ordering {
    a.grade_point.cmp(&b.grade_point).then_with(|| {
        match (a.marks.percentage(), b.marks.percentage()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    })
}
