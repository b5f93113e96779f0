//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! pdfium needs a file-system path, so URLs are downloaded into a
//! [`TempDir`] that lives as long as the [`ResolvedInput`]. Each input is
//! classified before extraction: files starting with the `%PDF` magic are
//! PDFs, `.txt` files are pre-extracted text dumps (pages separated by form
//! feeds), anything else is rejected with [`Pdf2GpaError::NotAPdf`].

use crate::error::Pdf2GpaError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// How a document's page texts are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A PDF read through pdfium's text layer.
    Pdf,
    /// A text dump with one page per form-feed-separated chunk.
    Text,
}

/// The resolved input: a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local { path: PathBuf, kind: DocumentKind },
    /// Input was a URL; the file was downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded {
        path: PathBuf,
        kind: DocumentKind,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    /// Get the path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local { path, .. } => path,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            ResolvedInput::Local { kind, .. } | ResolvedInput::Downloaded { kind, .. } => *kind,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists, is readable and is a
/// supported kind.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2GpaError> {
    if input.trim().is_empty() {
        return Err(Pdf2GpaError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Decide the document kind from its first bytes and file name.
pub fn classify(path: &Path, head: &[u8]) -> Result<DocumentKind, Pdf2GpaError> {
    if head.starts_with(b"%PDF") {
        return Ok(DocumentKind::Pdf);
    }
    let is_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    if is_txt {
        return Ok(DocumentKind::Text);
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(Pdf2GpaError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

/// Resolve a local file path, validating existence and kind.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2GpaError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Pdf2GpaError::FileNotFound { path });
    }

    let kind = match std::fs::File::open(&path) {
        Ok(f) => {
            use std::io::Read;
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| Pdf2GpaError::Internal(format!("Failed to read {}: {e}", path.display())))?;
            classify(&path, &head)?
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2GpaError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2GpaError::FileNotFound { path });
        }
    };

    debug!("Resolved local {:?} input: {}", kind, path.display());
    Ok(ResolvedInput::Local { path, kind })
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2GpaError> {
    info!("Downloading transcript from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2GpaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2GpaError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2GpaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2GpaError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| Pdf2GpaError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2GpaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Pdf2GpaError::Internal(format!("Failed to write temp file: {}", e)))?;

    let kind = classify(&file_path, &bytes[..bytes.len().min(4)])?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        kind,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
