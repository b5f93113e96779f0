//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn GpaProgressCallback>`] via
//! [`crate::config::GpaConfigBuilder::progress_callback`] to receive events
//! as the batch extracts and grades each document.
//!
//! # Example
//!
//! ```rust
//! use pdf2gpa::{GpaConfig, GpaProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: Arc<AtomicUsize>,
//! }
//!
//! impl GpaProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, pages: usize, attempts: usize) {
//!         self.pages.fetch_add(pages, Ordering::SeqCst);
//!         eprintln!("Document {}/{}: {} results", index, total, attempts);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     pages: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = GpaConfig::builder()
//!     .progress_callback(counter as Arc<dyn GpaProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::compute::compute`] as it processes a batch.
///
/// Implementations must be `Send + Sync`: documents are extracted
/// concurrently, although events for one batch are emitted from the task
/// that drives it. All methods default to no-ops.
pub trait GpaProgressCallback: Send + Sync {
    /// Called once before any document is opened.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document's extracted text is about to be graded.
    ///
    /// # Arguments
    /// * `index`  — 1-indexed document number
    /// * `total`  — documents in the batch
    /// * `source` — the path or URL as supplied
    fn on_document_start(&self, index: usize, total: usize, source: &str) {
        let _ = (index, total, source);
    }

    /// Called after a document's pages have been fed to the pipeline.
    ///
    /// # Arguments
    /// * `pages`    — pages read from the document
    /// * `attempts` — attempt records extracted from those pages
    fn on_document_complete(&self, index: usize, total: usize, pages: usize, attempts: usize) {
        let _ = (index, total, pages, attempts);
    }

    /// Called when a document aborts the batch.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after a transcript was produced.
    ///
    /// # Arguments
    /// * `total_documents` — documents in the batch
    /// * `subjects`        — distinct subjects after reduction
    fn on_batch_complete(&self, total_documents: usize, subjects: usize) {
        let _ = (total_documents, subjects);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GpaProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GpaConfig`].
pub type ProgressCallback = Arc<dyn GpaProgressCallback>;
