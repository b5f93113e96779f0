//! Configuration types for transcript grading.
//!
//! All pipeline behaviour is controlled through [`GpaConfig`], built via its
//! [`GpaConfigBuilder`]. The grading policy itself (credit table, rules,
//! grade ladder) lives in the [`GradingScheme`] the config points at; the
//! config adds the variation points that are not scheme data, such as the
//! marks-disambiguation policy and the per-document page cap.

use crate::error::Pdf2GpaError;
use crate::progress::ProgressCallback;
use crate::scheme::GradingScheme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one grading batch.
///
/// Built via [`GpaConfig::builder()`] or using [`GpaConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2gpa::{GpaConfig, MarksPolicy};
///
/// let config = GpaConfig::builder()
///     .marks_policy(MarksPolicy::Columnar)
///     .max_pages_per_document(50)
///     .build()
///     .unwrap();
/// assert_eq!(config.scheme.name, "vtu-2022");
/// ```
#[derive(Clone)]
pub struct GpaConfig {
    /// Grading policy. Default: the built-in `vtu-2022` scheme.
    pub scheme: Arc<GradingScheme>,

    /// How the total is chosen when a result line prints several numbers.
    /// Default: [`MarksPolicy::Maximum`].
    pub marks_policy: MarksPolicy,

    /// Hard cap on pages per document. Default: 500.
    ///
    /// Transcripts run to a few pages per semester; a document far beyond
    /// that is not a transcript and is rejected with
    /// [`Pdf2GpaError::TooManyPages`] before its pages are read.
    pub max_pages_per_document: usize,

    /// Number of documents whose text is extracted concurrently. Default: 4.
    ///
    /// Extraction results are still consumed in input order, so the identity
    /// lock and tie-breaks do not depend on this value.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GpaConfig {
    fn default() -> Self {
        Self {
            scheme: Arc::new(GradingScheme::vtu_2022()),
            marks_policy: MarksPolicy::default(),
            max_pages_per_document: 500,
            concurrency: 4,
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GpaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpaConfig")
            .field("scheme", &self.scheme.name)
            .field("marks_policy", &self.marks_policy)
            .field("max_pages_per_document", &self.max_pages_per_document)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GpaProgressCallback>"),
            )
            .finish()
    }
}

impl GpaConfig {
    /// Create a new builder for `GpaConfig`.
    pub fn builder() -> GpaConfigBuilder {
        GpaConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GpaConfig`].
#[derive(Debug)]
pub struct GpaConfigBuilder {
    config: GpaConfig,
}

impl GpaConfigBuilder {
    pub fn scheme(mut self, scheme: GradingScheme) -> Self {
        self.config.scheme = Arc::new(scheme);
        self
    }

    pub fn shared_scheme(mut self, scheme: Arc<GradingScheme>) -> Self {
        self.config.scheme = scheme;
        self
    }

    pub fn marks_policy(mut self, policy: MarksPolicy) -> Self {
        self.config.marks_policy = policy;
        self
    }

    pub fn max_pages_per_document(mut self, n: usize) -> Self {
        self.config.max_pages_per_document = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints and the scheme.
    pub fn build(self) -> Result<GpaConfig, Pdf2GpaError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Pdf2GpaError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.max_pages_per_document == 0 {
            return Err(Pdf2GpaError::InvalidConfig(
                "Page cap must be ≥ 1".into(),
            ));
        }
        c.scheme.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Rule for choosing the total when a result line prints several numbers.
///
/// | Policy | 1 number | 2 numbers | 3+ numbers |
/// |--------|----------|-----------|------------|
/// | `Maximum` | it | larger | largest |
/// | `Columnar` | it | internal + external | last |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarksPolicy {
    /// Largest plausible number on the line. (default)
    #[default]
    Maximum,
    /// Column-position reading for layouts that print internal and external
    /// marks without a total.
    Columnar,
}
