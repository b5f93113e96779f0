//! Pipeline stages for transcript grading.
//!
//! Each submodule implements exactly one step. The I/O shell ([`input`],
//! [`text`]) produces page strings; everything after it is pure and works on
//! text already in memory.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ normalize ──▶ identity ──▶ extract ──▶ credit ──▶ grade ──▶ reduce ──▶ aggregate
//! (URL/path) (pdfium) (cleanup)     (lock)       (lines)     (weights)  (points)  (best)     (SGPA/CGPA)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local file
//! 2. [`text`]      — one string per page; pdfium runs in `spawn_blocking`
//! 3. [`normalize`] — deterministic cleanup of extraction artefacts
//! 4. [`identity`]  — abort when a second student identifier appears
//! 5. [`extract`]   — one attempt record per result line
//! 6. [`credit`]    — credit table, then ordered fallback rules
//! 7. [`grade`]     — grade ladder lookup
//! 8. [`reduce`]    — keep the best attempt per subject code
//! 9. [`aggregate`] — credit-weighted averages
//!
//! [`crate::compute::TranscriptBuilder`] wires stages 3–8 together per page.

pub mod aggregate;
pub mod credit;
pub mod extract;
pub mod grade;
pub mod identity;
pub mod input;
pub mod normalize;
pub mod reduce;
pub mod text;
