//! # pdf2gpa
//!
//! Compute SGPA and CGPA from university result transcripts.
//!
//! ## Why this crate?
//!
//! Result PDFs print one line per subject attempt: a course code, a few mark
//! columns and a pass/fail verdict. They rarely print credits, and a student
//! who re-sat a subject shows up twice. This crate reads the text layer of
//! every page, recovers each attempt, keeps the best one per subject, looks
//! up or infers credit weights, and produces credit-weighted averages per
//! semester and overall.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs / text dumps
//!  │
//!  ├─ 1. Input      resolve local files or download from URLs
//!  ├─ 2. Text       per-page text via pdfium (spawn_blocking) or form feeds
//!  ├─ 3. Normalise  line endings, invisible characters, odd spaces
//!  ├─ 4. Identity   lock the batch to one student identifier
//!  ├─ 5. Extract    course code, total marks, verdict per line
//!  ├─ 6. Credit     table lookup, then rule-based fallback
//!  ├─ 7. Grade      percentage → letter and grade point
//!  ├─ 8. Reduce     best attempt per subject
//!  └─ 9. Aggregate  SGPA per semester, CGPA overall
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2gpa::{compute, GpaConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GpaConfig::default();
//!     let output = compute(["sem3.pdf", "sem4.pdf"], &config).await?;
//!     for sem in &output.transcript.semesters {
//!         println!("Semester {}: SGPA {:.2}", sem.semester, sem.sgpa);
//!     }
//!     println!("CGPA {:.2}", output.transcript.cgpa);
//!     Ok(())
//! }
//! ```
//!
//! Page texts already in memory skip the I/O shell entirely:
//!
//! ```rust
//! use pdf2gpa::{compute_from_pages, GpaConfig};
//!
//! let pages = ["1AB21EC001\nBEC302 Digital System Design 83 P"];
//! let transcript = compute_from_pages(pages, &GpaConfig::default()).unwrap();
//! assert_eq!(transcript.cgpa, 9.0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2gpa` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2gpa = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! PDF inputs need the pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH` to the library file (or its directory), or install it
//! where the system loader finds it. Text dumps (`.txt`, pages separated by
//! form feeds) need no pdfium at all.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compute;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scheme;
pub mod subject;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compute::{
    compute, compute_from_bytes, compute_from_pages, compute_sync, compute_to_file, inspect,
    TranscriptBuilder,
};
pub use config::{GpaConfig, GpaConfigBuilder, MarksPolicy};
pub use error::{ExtractionFailure, PageError, Pdf2GpaError};
pub use output::{
    DocumentReport, GpaOutput, GpaStats, SemesterSummary, SubjectRecord, TranscriptResult,
};
pub use pipeline::credit::{CreditRule, CreditRuleKind, CreditSource};
pub use pipeline::grade::{GradeBand, GradeLadder};
pub use pipeline::identity::StudentIdentifier;
pub use progress::{GpaProgressCallback, NoopProgressCallback, ProgressCallback};
pub use scheme::GradingScheme;
pub use subject::{Marks, PassFail, SubjectCode};
