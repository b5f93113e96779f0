//! Batch entry points and the single-owner pipeline driver.
//!
//! [`TranscriptBuilder`] owns the only mutable state of a batch: the locked
//! student identifier and the best-attempt map. Pages are fed to it one at a
//! time; it normalises the text, runs the identity guard, extracts attempts,
//! resolves credits, grades, and offers each attempt to the reducer. An
//! identity conflict stops the batch at the page where it surfaces.
//!
//! The async [`compute`] wraps the builder with the I/O shell: it resolves
//! inputs, extracts page text from several documents concurrently, and feeds
//! the results to the builder strictly in input order.

use crate::config::{GpaConfig, MarksPolicy};
use crate::error::{ExtractionFailure, Pdf2GpaError};
use crate::output::{DocumentReport, GpaOutput, GpaStats, SubjectRecord, TranscriptResult};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::credit::CreditResolver;
use crate::pipeline::extract::RecordExtractor;
use crate::pipeline::grade::GradeLadder;
use crate::pipeline::identity::{IdentityGuard, StudentIdentifier};
use crate::pipeline::normalize::normalize_page;
use crate::pipeline::reduce::BestAttemptReducer;
use crate::pipeline::{input, text};
use crate::scheme::GradingScheme;
use crate::subject::{AttemptRecord, Marks};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// What one page contributed to the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutcome {
    /// Attempt records extracted from the page.
    pub attempts: usize,
    /// Identifier printed on the page, if any.
    pub identifier: Option<StudentIdentifier>,
}

/// Stateful driver for one batch of pages.
#[derive(Debug)]
pub struct TranscriptBuilder<'s> {
    scheme: &'s GradingScheme,
    extractor: RecordExtractor<'s>,
    resolver: CreditResolver<'s>,
    guard: IdentityGuard,
    reducer: BestAttemptReducer,
    identity: Option<StudentIdentifier>,
    pages_seen: usize,
}

impl<'s> TranscriptBuilder<'s> {
    pub fn new(scheme: &'s GradingScheme, policy: MarksPolicy) -> Result<Self, Pdf2GpaError> {
        Ok(Self {
            scheme,
            extractor: RecordExtractor::new(scheme, policy)?,
            resolver: CreditResolver::new(scheme),
            guard: IdentityGuard::new(scheme)?,
            reducer: BestAttemptReducer::new(),
            identity: None,
            pages_seen: 0,
        })
    }

    pub fn from_config(config: &'s GpaConfig) -> Result<Self, Pdf2GpaError> {
        Self::new(&config.scheme, config.marks_policy)
    }

    /// Feed the next page of the batch.
    pub fn ingest_page(&mut self, raw_text: &str) -> Result<PageOutcome, ExtractionFailure> {
        self.pages_seen += 1;
        let text = normalize_page(raw_text);

        let detected = self.guard.detect(&text);
        self.identity = self
            .guard
            .check(&text, self.identity.clone(), self.pages_seen)?;

        let mut attempts = 0;
        for attempt in self.extractor.extract(&text) {
            let record = grade_attempt(&self.resolver, &self.scheme.grade_ladder, attempt);
            self.reducer.offer(record);
            attempts += 1;
        }

        debug!(
            "Page {}: {} attempts, identifier {:?}",
            self.pages_seen, attempts, detected
        );

        Ok(PageOutcome {
            attempts,
            identifier: detected,
        })
    }

    /// The batch's locked identifier so far.
    pub fn identity(&self) -> Option<&StudentIdentifier> {
        self.identity.as_ref()
    }

    pub fn pages_seen(&self) -> usize {
        self.pages_seen
    }

    pub fn attempts_seen(&self) -> usize {
        self.reducer.offered()
    }

    /// Aggregate the retained attempts. Fails with
    /// [`ExtractionFailure::NoData`] when nothing was extracted.
    pub fn finish(self) -> Result<TranscriptResult, ExtractionFailure> {
        aggregate(self.reducer.finish())
    }
}

/// Resolve credits for an attempt and grade it.
pub fn grade_attempt(
    resolver: &CreditResolver<'_>,
    ladder: &GradeLadder,
    attempt: AttemptRecord,
) -> SubjectRecord {
    let resolution = resolver.resolve(&attempt.code);
    let grade = match &attempt.marks {
        Marks::Numeric { percentage, .. } => ladder.grade_of(*percentage, attempt.pass_fail),
        Marks::Letter { letter } => ladder
            .grade_for_letter(letter, attempt.pass_fail)
            .unwrap_or_else(|| ladder.grade_of(0.0, attempt.pass_fail)),
    };

    SubjectRecord {
        code: attempt.code,
        marks: attempt.marks,
        pass_fail: attempt.pass_fail,
        letter_grade: grade.letter,
        grade_point: grade.points,
        credits: resolution.credits,
        credit_source: resolution.source,
        semester: resolution.semester,
    }
}

/// Run the grading core over page texts already in memory.
///
/// Pages are processed in iteration order as one batch.
pub fn compute_from_pages<I, S>(pages: I, config: &GpaConfig) -> Result<TranscriptResult, Pdf2GpaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TranscriptBuilder::from_config(config)?;
    for page in pages {
        builder.ingest_page(page.as_ref())?;
    }
    Ok(builder.finish()?)
}

/// Grade a batch of transcript documents.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `inputs` — local file paths or HTTP/HTTPS URLs; PDFs or `.txt` dumps
/// * `config` — grading configuration
///
/// # Errors
/// - Any input that cannot be resolved or read (fatal for the batch)
/// - [`ExtractionFailure::IdentityConflict`] as soon as a second student appears
/// - [`ExtractionFailure::NoData`] when no subject result was found
pub async fn compute<I, S>(inputs: I, config: &GpaConfig) -> Result<GpaOutput, Pdf2GpaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let total_start = Instant::now();
    let sources: Vec<String> = inputs.into_iter().map(|s| s.as_ref().to_string()).collect();
    let total = sources.len();
    info!(
        "Starting batch: {} documents, scheme {}",
        total, config.scheme.name
    );

    let mut builder = TranscriptBuilder::from_config(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Extract page text, several documents at a time, in input order ──
    let timeout = config.download_timeout_secs;
    let max_pages = config.max_pages_per_document;
    let mut documents = stream::iter(sources.into_iter().map(|source| {
        let password = config.password.clone();
        async move {
            let resolved = input::resolve_input(&source, timeout).await?;
            let kind = resolved.kind();
            let doc = text::extract_document(resolved.path(), kind, password.as_deref(), max_pages)
                .await?;
            Ok::<_, Pdf2GpaError>((source, kind, doc))
        }
    }))
    .buffered(config.concurrency.max(1));

    let extract_start = Instant::now();
    let mut reports: Vec<DocumentReport> = Vec::with_capacity(total);
    let mut index = 0;

    while let Some(next) = documents.next().await {
        index += 1;
        let (source, kind, doc) = match next {
            Ok(v) => v,
            Err(e) => return Err(report_error(config, index, total, e)),
        };

        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index, total, &source);
        }

        let mut report = DocumentReport {
            source,
            kind,
            pages: doc.pages.len(),
            attempts: 0,
            identifier: None,
            page_errors: doc.page_errors,
        };

        // ── Feed pages to the single-owner builder ───────────────────────
        for page in &doc.pages {
            let outcome = builder
                .ingest_page(page)
                .map_err(|e| report_error(config, index, total, e.into()))?;
            report.attempts += outcome.attempts;
            if report.identifier.is_none() {
                report.identifier = outcome.identifier;
            }
        }

        info!(
            "Document {}/{} ({}): {} pages, {} attempts",
            index, total, report.source, report.pages, report.attempts
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_complete(index, total, report.pages, report.attempts);
        }
        reports.push(report);
    }
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Aggregate ────────────────────────────────────────────────────────
    let identifier = builder.identity().cloned();
    let pages = builder.pages_seen();
    let attempts = builder.attempts_seen();
    let transcript = builder.finish()?;

    let stats = GpaStats {
        documents: reports.len(),
        pages,
        attempts,
        subjects: transcript.subject_count(),
        fallback_credit_subjects: transcript.fallback_codes().len(),
        extract_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {} subjects over {} semesters, CGPA {:.2}, {}ms total",
        stats.subjects,
        transcript.semesters.len(),
        transcript.cgpa,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.subjects);
    }

    Ok(GpaOutput {
        transcript,
        identifier,
        scheme: config.scheme.name.clone(),
        documents: reports,
        stats,
    })
}

/// Grade a batch and write the JSON output directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn compute_to_file<I, S>(
    inputs: I,
    output_path: impl AsRef<Path>,
    config: &GpaConfig,
) -> Result<GpaOutput, Pdf2GpaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let output = compute(inputs, config).await?;
    let path = output_path.as_ref();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Pdf2GpaError::Internal(format!("Failed to serialise output: {e}")))?;

    let write_failed = |source: std::io::Error| Pdf2GpaError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;

    Ok(output)
}

/// Synchronous wrapper around [`compute`].
///
/// Creates a temporary tokio runtime internally.
pub fn compute_sync<I, S>(inputs: I, config: &GpaConfig) -> Result<GpaOutput, Pdf2GpaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2GpaError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(compute(inputs, config))
}

/// Grade one in-memory document: PDF bytes, or a UTF-8 text dump.
///
/// The bytes are written to a managed [`tempfile`] that is removed on
/// return.
pub async fn compute_from_bytes(bytes: &[u8], config: &GpaConfig) -> Result<GpaOutput, Pdf2GpaError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .map_err(|e| Pdf2GpaError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2GpaError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `compute` returns
    compute([path], config).await
}

/// Read one document without grading it: page count, identifier and the
/// number of result lines found.
pub async fn inspect(input_str: impl AsRef<str>, config: &GpaConfig) -> Result<DocumentReport, Pdf2GpaError> {
    let source = input_str.as_ref().to_string();
    let resolved = input::resolve_input(&source, config.download_timeout_secs).await?;
    let doc = text::extract_document(
        resolved.path(),
        resolved.kind(),
        config.password.as_deref(),
        config.max_pages_per_document,
    )
    .await?;

    let extractor = RecordExtractor::new(&config.scheme, config.marks_policy)?;
    let guard = IdentityGuard::new(&config.scheme)?;
    let pages: Vec<String> = doc.pages.iter().map(|p| normalize_page(p)).collect();

    Ok(DocumentReport {
        source,
        kind: resolved.kind(),
        pages: pages.len(),
        attempts: pages.iter().map(|p| extractor.extract(p).count()).sum(),
        identifier: pages.iter().find_map(|p| guard.detect(p)),
        page_errors: doc.page_errors,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn report_error(config: &GpaConfig, index: usize, total: usize, e: Pdf2GpaError) -> Pdf2GpaError {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_error(index, total, &e.to_string());
    }
    e
}
