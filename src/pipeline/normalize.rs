//! Text normalisation: deterministic cleanup of extracted page text.
//!
//! PDF text layers from transcript portals carry artefacts that break
//! word-boundary matching: diagonal watermarks leave zero-width joiners and
//! soft hyphens inside codes, tables are padded with non-breaking or
//! figure spaces, and some generators emit CR-only line endings. Each rule
//! below is a pure `&str → String` pass; none of them joins lines, so line
//! numbers in [`crate::subject::AttemptRecord`] still match the extracted
//! text.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so later passes see `\n` only;
//! invisible characters are removed before spaces are mapped so that
//! `B\u{200B}EC302` collapses to `BEC302` rather than `B EC302`.

/// Apply all normalisation rules to one page of extracted text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Remove invisible Unicode (zero-width, BOM, soft hyphen, word joiner)
/// 3. Map exotic spaces (NBSP, figure space, ideographic space, tabs) to ASCII space
/// 4. Drop remaining control characters (form feeds, NUL, …)
/// 5. Trim trailing whitespace per line
pub fn normalize_page(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = map_unicode_spaces(&s);
    let s = drop_control_chars(&s);
    trim_trailing_whitespace(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Map exotic spaces ───────────────────────────────────────────────

fn map_unicode_spaces(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\t' | '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{3000}' => ' ',
            '\u{2000}'..='\u{200A}' => ' ',
            other => other,
        })
        .collect()
}

// ── Rule 4: Drop control characters ─────────────────────────────────────────

fn drop_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

// ── Rule 5: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
