//! Token cost estimation.
//!
//! The context budget is denominated in language-model tokens the engine never
//! sees exactly, so everything downstream works from the same rough heuristic:
//! four characters per token. Consistency matters more than accuracy here —
//! the cleanup coordinator only compares estimates against each other and
//! against the configured budget.

use crate::world::{HistoryEntry, Memory};

/// Characters per estimated token.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token cost of a piece of text.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the context cost of a memory record (text plus tag words).
pub fn memory_tokens(memory: &Memory) -> usize {
    let tag_chars: usize = memory.tags.iter().map(|t| t.chars().count() + 1).sum();
    estimate_tokens(&memory.text) + tag_chars.div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the context cost of a run of history entries.
pub fn history_tokens(entries: &[HistoryEntry]) -> usize {
    entries.iter().map(|e| estimate_tokens(&e.text)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 8 characters, far more bytes.
        assert_eq!(estimate_tokens("kiếm khí"), 2);
    }
}
