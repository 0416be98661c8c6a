//! Rolling conversation digest.
//!
//! The digest is a newline-delimited log holding one entry per exchange.
//! Appending drops the oldest entries once the log is full. Identical
//! exchanges produce identical entries; nothing is deduplicated.

use crate::domain::foundation::{collapse_whitespace, truncate_chars};

/// Maximum number of entries kept in a summary.
pub const SUMMARY_CAPACITY: usize = 8;

/// Maximum characters kept from each side of an exchange.
pub const ENTRY_CHAR_LIMIT: usize = 140;

/// Formats one exchange as a single summary line.
pub fn summary_entry(user_message: &str, assistant_message: &str) -> String {
    let user = truncate_chars(&collapse_whitespace(user_message), ENTRY_CHAR_LIMIT);
    let assistant = truncate_chars(&collapse_whitespace(assistant_message), ENTRY_CHAR_LIMIT);
    format!("User: {} | Companion: {}", user, assistant)
}

/// Appends an exchange to the previous summary and keeps the newest
/// `SUMMARY_CAPACITY` entries.
pub fn append(previous: Option<&str>, user_message: &str, assistant_message: &str) -> String {
    let entry = summary_entry(user_message, assistant_message);
    let mut entries: Vec<&str> = previous
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    entries.push(&entry);

    let skip = entries.len().saturating_sub(SUMMARY_CAPACITY);
    entries[skip..].join("\n")
}

/// Number of entries in a stored summary.
pub fn entry_count(summary: &str) -> usize {
    summary.lines().filter(|l| !l.trim().is_empty()).count()
}
