//! Plain-text export of a list.

use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::models::List;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

const RULE: &str = "--------------------------------";

/// Renders the list as shareable text, items in stored order.
pub fn render(list: &List, date: NaiveDate) -> String {
    let mut content = format!("LIST: {}\n", list.name);
    content.push_str(&format!("Created on: {}\n", date.format("%Y-%m-%d")));
    content.push_str(RULE);
    content.push_str("\n\n");

    for item in &list.items {
        let mark = if item.is_checked { "[DONE]" } else { "[TODO]" };
        content.push_str(&format!("{} {}", mark, item.text));
        if !item.note.is_empty() {
            content.push_str(&format!(" | Note: {}", item.note));
        }
        content.push('\n');
    }

    content
}

/// File name for a downloaded export, e.g. `Weekly_Shop_backup.txt`.
///
/// Path separators become `_`, so the result is always a single component.
pub fn file_name(list_name: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(list_name, "_");
    format!("{}_backup.txt", collapsed.replace(['/', '\\'], "_"))
}

/// Writes the export into `dir` and returns the file path.
pub fn write_to_dir(list: &List, date: NaiveDate, dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(&list.name));
    fs::write(&path, render(list, date))?;
    tracing::debug!(path = %path.display(), "Exported list");
    Ok(path)
}
