//! Error types for the pdf2gpa library.
//!
//! Three types reflect three failure modes:
//!
//! * [`ExtractionFailure`]: the grading core could not produce a
//!   transcript because the batch mixed two students or nothing recognisable
//!   was found. Returned by the pure pipeline ([`crate::compute::compute_from_pages`],
//!   [`crate::compute::TranscriptBuilder`]) and serialisable so presentation
//!   layers can render it directly.
//!
//! * [`Pdf2GpaError`]: **fatal** shell errors such as a bad input file, a
//!   wrong password or a missing pdfium library. Wraps [`ExtractionFailure`] so the
//!   top-level `compute*` functions have a single error type.
//!
//! * [`PageError`]: **non-fatal**, one page's text layer could not be read.
//!   The page is treated as empty and the error is recorded on the
//!   document's [`crate::output::DocumentReport`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A terminal failure of the grading core.
///
/// No partial result accompanies either variant.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionFailure {
    /// Two distinct student identifiers were observed in one batch.
    #[error(
        "Documents belong to different students: '{locked}' was seen first, \
         then '{found}' on page {page}"
    )]
    IdentityConflict {
        /// The identifier locked by the first page that carried one.
        locked: String,
        /// The conflicting identifier.
        found: String,
        /// 1-indexed page number within the batch at which the conflict surfaced.
        page: usize,
    },

    /// Extraction produced zero subject records.
    #[error("No subject results found in the supplied documents")]
    NoData,
}

/// All fatal errors returned by the pdf2gpa library.
#[derive(Debug, Error)]
pub enum Pdf2GpaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Transcript file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is neither a PDF nor a text dump.
    #[error("File is not a PDF or a .txt text dump: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document exceeds the per-document page cap.
    #[error("'{path}' has {pages} pages; at most {limit} are processed per document")]
    TooManyPages {
        path: PathBuf,
        pages: usize,
        limit: usize,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or the directory containing it),\n\
or install libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Grading errors ────────────────────────────────────────────────────
    /// The grading core rejected the batch.
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A grading scheme failed to parse or validate.
    #[error("Invalid grading scheme '{name}': {reason}")]
    InvalidScheme { name: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum PageError {
    /// pdfium could not load the page or its text layer.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextUnavailable { page: usize, detail: String },
}
