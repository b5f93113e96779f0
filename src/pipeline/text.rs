//! Page-text extraction: one string per page, in page order.
//!
//! PDFs are read through pdfium's text layer. pdfium is a C++ library with
//! thread-local state, so the work runs inside `spawn_blocking`. Text dumps
//! (`pdftotext` output) are split on form feeds. A page whose text cannot be
//! read becomes an empty string plus a [`PageError`]; only document-level
//! failures (corrupt file, wrong password, too many pages) are fatal.

use crate::error::{PageError, Pdf2GpaError};
use crate::pipeline::input::DocumentKind;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Page separator in text dumps.
pub const FORM_FEED: char = '\u{0C}';

/// The page texts of one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    pub pages: Vec<String>,
    pub page_errors: Vec<PageError>,
}

/// Extract every page's text from a resolved document.
///
/// Documents with more than `max_pages` pages are rejected before any page
/// is read.
pub async fn extract_document(
    path: &Path,
    kind: DocumentKind,
    password: Option<&str>,
    max_pages: usize,
) -> Result<DocumentText, Pdf2GpaError> {
    match kind {
        DocumentKind::Text => {
            let raw = tokio::fs::read(path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => Pdf2GpaError::PermissionDenied {
                    path: path.to_path_buf(),
                },
                _ => Pdf2GpaError::FileNotFound {
                    path: path.to_path_buf(),
                },
            })?;
            let pages = split_text_dump(&String::from_utf8_lossy(&raw));
            check_page_cap(path, pages.len(), max_pages)?;
            debug!("Read {} pages from text dump {}", pages.len(), path.display());
            Ok(DocumentText {
                pages,
                page_errors: Vec::new(),
            })
        }
        DocumentKind::Pdf => {
            let path = path.to_path_buf();
            let pwd = password.map(|s| s.to_string());
            tokio::task::spawn_blocking(move || extract_pdf_blocking(&path, pwd.as_deref(), max_pages))
                .await
                .map_err(|e| Pdf2GpaError::Internal(format!("Text extraction task panicked: {}", e)))?
        }
    }
}

/// Split a text dump into pages on form feeds.
///
/// `pdftotext` terminates the last page with a form feed too; that trailing
/// empty chunk is dropped. Empty pages in the middle are kept.
pub fn split_text_dump(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn check_page_cap(path: &Path, pages: usize, limit: usize) -> Result<(), Pdf2GpaError> {
    if pages > limit {
        return Err(Pdf2GpaError::TooManyPages {
            path: path.to_path_buf(),
            pages,
            limit,
        });
    }
    Ok(())
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` (a library file or the directory
/// holding it) when set, otherwise the system library.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2GpaError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.trim().is_empty() => {
            let path = PathBuf::from(p);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2GpaError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of PDF text extraction.
fn extract_pdf_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    max_pages: usize,
) -> Result<DocumentText, Pdf2GpaError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2GpaError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2GpaError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2GpaError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    check_page_cap(pdf_path, total_pages, max_pages)?;
    info!("PDF loaded: {} pages", total_pages);

    let mut out = DocumentText {
        pages: Vec::with_capacity(total_pages),
        page_errors: Vec::new(),
    };

    for idx in 0..total_pages {
        let text = pages
            .get(idx as u16)
            .and_then(|page| page.text().map(|t| t.all()));

        match text {
            Ok(text) => {
                debug!("Page {} → {} chars", idx + 1, text.len());
                out.pages.push(text);
            }
            Err(e) => {
                warn!("No text layer on page {} of {}: {:?}", idx + 1, pdf_path.display(), e);
                out.page_errors.push(PageError::TextUnavailable {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                });
                out.pages.push(String::new());
            }
        }
    }

    Ok(out)
}
