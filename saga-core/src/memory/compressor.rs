//! History compression.
//!
//! When raw history outgrows its budget, the oldest entries collapse into a
//! single summary segment. Raw entries are removed; the segment preserves the
//! turn span and a digest of the narrative beats, so the transcript can still
//! be prefixed with "what happened before" at a fraction of the token cost.

use tracing::info;

use crate::memory::tokens::estimate_tokens;
use crate::world::{CompressedSegment, GameState, HistoryEntry, HistoryRole};

/// Longest slice of any one entry quoted into a digest line.
const DIGEST_CHARS: usize = 90;

/// At most this many digest lines per segment.
const MAX_DIGEST_LINES: usize = 6;

fn digest_line(entry: &HistoryEntry) -> String {
    let trimmed = entry.text.trim();
    let cut = trimmed
        .char_indices()
        .nth(DIGEST_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    if cut < trimmed.len() {
        format!("- {}...", trimmed[..cut].trim_end())
    } else {
        format!("- {trimmed}")
    }
}

fn summarize(entries: &[HistoryEntry]) -> String {
    let first_turn = entries.first().map(|e| e.turn).unwrap_or(0);
    let last_turn = entries.last().map(|e| e.turn).unwrap_or(0);
    let mut summary = format!(
        "Lược sử lượt {}-{} ({} đoạn hội thoại):",
        first_turn,
        last_turn,
        entries.len()
    );
    // Only model entries carry narrative; player inputs are commands.
    for entry in entries
        .iter()
        .filter(|e| e.role == HistoryRole::Model)
        .take(MAX_DIGEST_LINES)
    {
        summary.push('\n');
        summary.push_str(&digest_line(entry));
    }
    summary
}

/// Collapse everything but the newest `keep_active` history entries into one
/// compressed segment appended to the state. Returns the segment, or `None`
/// when there is nothing old enough to fold.
pub fn compress(state: &mut GameState, keep_active: usize) -> Option<CompressedSegment> {
    if state.history.len() <= keep_active {
        return None;
    }
    let fold = state.history.len() - keep_active;
    let removed: Vec<HistoryEntry> = state.history.drain(..fold).collect();

    let summary = summarize(&removed);
    let segment = CompressedSegment {
        token_estimate: estimate_tokens(&summary),
        first_turn: removed.first().map(|e| e.turn).unwrap_or(0),
        last_turn: removed.last().map(|e| e.turn).unwrap_or(0),
        summary,
    };
    info!(
        folded = removed.len(),
        first_turn = segment.first_turn,
        last_turn = segment.last_turn,
        "compressed history"
    );
    state.compressed_history.push(segment.clone());
    Some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_turns(count: u64) -> GameState {
        let mut state = GameState::new("Lý Thanh Vân");
        for turn in 0..count {
            state.turn_count = turn;
            state.push_history(HistoryRole::User, format!("lệnh lượt {turn}"));
            state.push_history(HistoryRole::Model, format!("diễn biến lượt {turn}"));
        }
        state
    }

    #[test]
    fn test_nothing_to_fold() {
        let mut state = state_with_turns(3);
        assert!(compress(&mut state, 10).is_none());
        assert_eq!(state.history.len(), 6);
        assert!(state.compressed_history.is_empty());
    }

    #[test]
    fn test_folds_oldest_keeps_newest() {
        let mut state = state_with_turns(10);
        let segment = compress(&mut state, 4).unwrap();

        assert_eq!(state.history.len(), 4);
        // Newest entries survive untouched.
        assert_eq!(state.history.last().unwrap().turn, 9);
        assert_eq!(segment.first_turn, 0);
        assert_eq!(segment.last_turn, 7);
        assert_eq!(state.compressed_history.len(), 1);
    }

    #[test]
    fn test_segment_cheaper_than_raw() {
        let mut state = state_with_turns(30);
        let before = crate::memory::tokens::history_tokens(&state.history);
        let segment = compress(&mut state, 5).unwrap();
        let after = crate::memory::tokens::history_tokens(&state.history);
        assert!(after + segment.token_estimate < before);
    }

    #[test]
    fn test_summary_mentions_span() {
        let mut state = state_with_turns(8);
        let segment = compress(&mut state, 2).unwrap();
        assert!(segment.summary.contains("lượt 0-6"));
        assert!(segment.summary.contains("diễn biến lượt 0"));
    }
}
