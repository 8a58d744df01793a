//! Line-level cleanup of raw OCR output.
//!
//! Each input line is handled on its own:
//! 1. a leading enumeration or bullet marker (`1.`, `-`, `*`, `•`, `2.3-` ...)
//!    and the whitespace after it are removed
//! 2. surrounding whitespace is trimmed
//! 3. lines with one character or less are dropped
//! 4. the first character is upper-cased (ASCII only)
//!
//! Output order matches input order. Nothing here can fail.

use regex::Regex;
use std::sync::LazyLock;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\-*•]+\s*").expect("marker pattern is valid"));

/// Cleans every line of `raw` and yields the ones worth keeping.
pub fn normalize(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split('\n').filter_map(clean_line)
}

/// Cleans a single line, returning `None` when it should be discarded.
pub fn clean_line(line: &str) -> Option<String> {
    let stripped = MARKER_RE.replace(line, "");
    let trimmed = stripped.trim();

    if trimmed.chars().count() <= 1 {
        return None;
    }

    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let mut cleaned = String::with_capacity(trimmed.len());
    cleaned.push(first.to_ascii_uppercase());
    cleaned.push_str(chars.as_str());
    Some(cleaned)
}
