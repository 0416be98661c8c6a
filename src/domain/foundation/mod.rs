//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the Moodlens domain.

mod errors;
mod ids;
mod percentage;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::ProfileId;
pub use percentage::Percentage;
pub use timestamp::Timestamp;

/// Trims and collapses internal whitespace runs into single spaces.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = input.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_normalizes_runs() {
        assert_eq!(collapse_whitespace("  aku \n\t capek   banget "), "aku capek banget");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn truncate_chars_keeps_short_input() {
        assert_eq!(truncate_chars("halo", 140), "halo");
    }

    #[test]
    fn truncate_chars_caps_length_and_marks_cut() {
        let long = "x".repeat(200);
        let cut = truncate_chars(&long, 140);
        assert_eq!(cut.chars().count(), 140);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 5).chars().count(), 5);
    }
}
