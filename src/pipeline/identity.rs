//! Identity guard: refuse to merge two students' transcripts.
//!
//! The first identifier observed in a batch becomes the locked identity.
//! Any later page carrying a different identifier aborts the batch with
//! [`ExtractionFailure::IdentityConflict`]. Pages without an identifier are
//! accepted unchanged.

use crate::error::{ExtractionFailure, Pdf2GpaError};
use crate::scheme::GradingScheme;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A student identifier such as a university seat number.
///
/// Used only for the batch consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentIdentifier(String);

impl StudentIdentifier {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct IdentityGuard {
    pattern: Regex,
}

impl IdentityGuard {
    pub fn new(scheme: &GradingScheme) -> Result<Self, Pdf2GpaError> {
        let pattern =
            Regex::new(&scheme.identifier_pattern).map_err(|e| Pdf2GpaError::InvalidScheme {
                name: scheme.name.clone(),
                reason: format!("identifier pattern does not compile: {e}"),
            })?;
        Ok(Self { pattern })
    }

    /// The first identifier printed on a page, if any.
    pub fn detect(&self, page_text: &str) -> Option<StudentIdentifier> {
        self.pattern
            .find(page_text)
            .map(|m| StudentIdentifier::new(m.as_str()))
    }

    /// Check one page against the batch state.
    ///
    /// Returns the (possibly newly locked) state, or a conflict naming both
    /// identifiers. `page` is the 1-indexed page number within the batch and
    /// is only used for reporting.
    pub fn check(
        &self,
        page_text: &str,
        state: Option<StudentIdentifier>,
        page: usize,
    ) -> Result<Option<StudentIdentifier>, ExtractionFailure> {
        match (state, self.detect(page_text)) {
            (Some(locked), Some(found)) if locked != found => {
                Err(ExtractionFailure::IdentityConflict {
                    locked: locked.to_string(),
                    found: found.to_string(),
                    page,
                })
            }
            (Some(locked), _) => Ok(Some(locked)),
            (None, found) => Ok(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> IdentityGuard {
        IdentityGuard::new(&GradingScheme::vtu_2022()).unwrap()
    }

    #[test]
    fn detects_usn() {
        let id = guard().detect("University Seat Number : 1AA21EC045\nStudent Name : X");
        assert_eq!(id, Some(StudentIdentifier::new("1AA21EC045")));
        assert_eq!(guard().detect("no identifier here BEC302 83"), None);
    }

    #[test]
    fn first_identifier_locks() {
        let g = guard();
        let state = g.check("USN 1AA21EC045", None, 1).unwrap();
        assert_eq!(state, Some(StudentIdentifier::new("1AA21EC045")));
        let state = g.check("USN 1AA21EC045 again", state, 2).unwrap();
        assert_eq!(state, Some(StudentIdentifier::new("1AA21EC045")));
    }

    #[test]
    fn pages_without_identifier_keep_state() {
        let g = guard();
        assert_eq!(g.check("BEC302 83 P", None, 1).unwrap(), None);
        let locked = Some(StudentIdentifier::new("1AA21EC045"));
        assert_eq!(g.check("BEC302 83 P", locked.clone(), 2).unwrap(), locked);
    }

    #[test]
    fn different_identifier_conflicts() {
        let g = guard();
        let locked = Some(StudentIdentifier::new("1AA21EC045"));
        let err = g.check("USN: 1AA21EC099", locked, 4).unwrap_err();
        assert_eq!(
            err,
            ExtractionFailure::IdentityConflict {
                locked: "1AA21EC045".into(),
                found: "1AA21EC099".into(),
                page: 4,
            }
        );
    }
}
