//! Unified cleanup coordinator.
//!
//! One entry point keeps the whole context footprint bounded: it decides
//! whether anything needs doing this turn, folds old history, mines new
//! memories, rescores everything, and then greedily selects which memories
//! stay active under the token budget. Runs at most once per turn and always
//! returns a fresh snapshot; callers never observe a half-applied pass.
//!
//! Exceeding a budget is the normal trigger condition here, not an error.
//! Errors only come out of configuration validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::memory::generator::{self, SmartMemoryConfig};
use crate::memory::tokens::{history_tokens, memory_tokens};
use crate::memory::{compressor, enhancer, scorer};
use crate::world::{CompressedSegment, GameState};

/// A kept memory is refreshed when it has not been touched for this many
/// turns, or when it references an entity active in recent history.
const STALE_AGE_TURNS: u64 = 10;

/// How far back "recent history" reaches when looking for active entities.
const RECENT_TURN_WINDOW: u64 = 5;

/// Tuning for a coordinator pass. Immutable; thread one value through every
/// call rather than relying on ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Hard ceiling on non-archived memories after a pass.
    pub max_active_memories: usize,
    /// Memory work triggers once active memories exceed this count.
    pub memory_count_threshold: usize,
    /// Importance below this counts a memory as low-value for triggering.
    pub low_importance_threshold: f32,
    /// Memory work also triggers once this many low-value memories pile up.
    pub low_importance_count_threshold: usize,
    /// Raw history entries kept verbatim after compression.
    pub max_active_history: usize,
    /// History work triggers once raw entries exceed this count.
    pub history_compression_threshold: usize,
    /// Total context budget in estimated tokens.
    pub token_budget: usize,
    /// Fraction of `token_budget` allotted to active memories; the remainder
    /// belongs to raw history and compressed segments.
    pub memory_token_share: f32,
    pub smart_memory: SmartMemoryConfig,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_active_memories: 50,
            memory_count_threshold: 40,
            low_importance_threshold: 30.0,
            low_importance_count_threshold: 10,
            max_active_history: 30,
            history_compression_threshold: 50,
            token_budget: 16_000,
            memory_token_share: 0.4,
            smart_memory: SmartMemoryConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("max_active_memories must be at least 1")]
    ZeroMemoryCeiling,
    #[error("token_budget must be at least 1")]
    ZeroTokenBudget,
    #[error("memory_token_share must be within (0, 1], got {0}")]
    BadTokenShare(f32),
    #[error(
        "history_compression_threshold ({threshold}) must be at least max_active_history ({keep})"
    )]
    HistoryThresholdTooLow { threshold: usize, keep: usize },
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<(), CleanupError> {
        if self.max_active_memories == 0 {
            return Err(CleanupError::ZeroMemoryCeiling);
        }
        if self.token_budget == 0 {
            return Err(CleanupError::ZeroTokenBudget);
        }
        if !(self.memory_token_share > 0.0 && self.memory_token_share <= 1.0) {
            return Err(CleanupError::BadTokenShare(self.memory_token_share));
        }
        if self.history_compression_threshold < self.max_active_history {
            return Err(CleanupError::HistoryThresholdTooLow {
                threshold: self.history_compression_threshold,
                keep: self.max_active_history,
            });
        }
        Ok(())
    }

    /// Estimated tokens allotted to active memories.
    pub fn memory_token_budget(&self) -> usize {
        (self.token_budget as f32 * self.memory_token_share) as usize
    }
}

/// What a coordinator pass did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// False when nothing triggered or the pass already ran this turn.
    pub ran: bool,
    /// Memories kept active after selection.
    pub kept: usize,
    /// Kept memories whose metadata was refreshed and re-enhanced.
    pub refreshed: usize,
    /// Memories soft-archived this pass.
    pub archived: usize,
    /// Memories produced by the smart memory generator.
    pub generated: usize,
    /// History segment folded this pass, if any.
    pub segment: Option<CompressedSegment>,
    /// Estimated context tokens reclaimed.
    pub tokens_saved: usize,
}

/// Entity names mentioned in history entries from the last few turns.
fn recently_active_entities(state: &GameState) -> Vec<String> {
    let cutoff = state.turn_count.saturating_sub(RECENT_TURN_WINDOW);
    let recent_text: String = state
        .history
        .iter()
        .filter(|e| e.turn >= cutoff)
        .map(|e| e.text.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");
    state
        .entities
        .values()
        .filter(|e| recent_text.contains(&e.name.to_lowercase()))
        .map(|e| e.name.clone())
        .collect()
}

/// Estimated context footprint of history plus active memories.
fn context_footprint(state: &GameState) -> usize {
    history_tokens(&state.history)
        + state
            .compressed_history
            .iter()
            .map(|s| s.token_estimate)
            .sum::<usize>()
        + state
            .memories
            .iter()
            .filter(|m| !m.archived)
            .map(memory_tokens)
            .sum::<usize>()
}

/// Run one coordinator pass over a snapshot.
///
/// Never mutates the input: the returned state is a fresh snapshot, identical
/// to the input when nothing triggered. Memory-side and history-side triggers
/// are evaluated independently; either one starts a full pass.
pub fn run_cleanup(
    state: &GameState,
    config: &CleanupConfig,
) -> Result<(GameState, CleanupReport), CleanupError> {
    config.validate()?;

    if state.last_cleanup_turn == Some(state.turn_count) {
        return Ok((state.clone(), CleanupReport::default()));
    }

    let history_over = state.history.len() > config.history_compression_threshold;
    let active: Vec<_> = state.memories.iter().filter(|m| !m.archived).collect();
    let low_count = active
        .iter()
        .filter(|m| scorer::score(m, state) < config.low_importance_threshold)
        .count();
    let memory_over = active.len() > config.memory_count_threshold
        || low_count > config.low_importance_count_threshold;

    if !history_over && !memory_over {
        return Ok((state.clone(), CleanupReport::default()));
    }

    let mut next = state.clone();
    let footprint_before = context_footprint(&next);
    let mut report = CleanupReport {
        ran: true,
        ..Default::default()
    };

    if history_over {
        report.segment = compressor::compress(&mut next, config.max_active_history);
    }

    let generated = generator::generate(&next, &config.smart_memory);
    report.generated = generated.len();
    next.memories.extend(generated);

    scorer::rescore_all(&mut next);

    // Greedy budget-bounded selection over the active set.
    let mut order: Vec<usize> = (0..next.memories.len())
        .filter(|&i| !next.memories[i].archived)
        .collect();
    order.sort_by(|&a, &b| {
        let (ma, mb) = (&next.memories[a], &next.memories[b]);
        mb.importance
            .partial_cmp(&ma.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(mb.last_accessed_turn.cmp(&ma.last_accessed_turn))
    });

    let memory_budget = config.memory_token_budget();
    let mut kept: Vec<usize> = Vec::new();
    let mut dropped: Vec<usize> = Vec::new();
    let mut spent = 0usize;

    // Pinned memories bypass the budget but not the hard ceiling.
    for &i in order.iter().filter(|&&i| next.memories[i].pinned) {
        if kept.len() < config.max_active_memories {
            spent += memory_tokens(&next.memories[i]);
            kept.push(i);
        } else {
            warn!(
                text = %next.memories[i].text,
                "pinned memory force-archived, active ceiling exceeded by pinned set"
            );
            dropped.push(i);
        }
    }
    for &i in order.iter().filter(|&&i| !next.memories[i].pinned) {
        let cost = memory_tokens(&next.memories[i]);
        if kept.len() < config.max_active_memories && spent + cost <= memory_budget {
            spent += cost;
            kept.push(i);
        } else {
            dropped.push(i);
        }
    }

    let snapshot = next.clone();
    let recent = recently_active_entities(&snapshot);
    for &i in &kept {
        let memory = &next.memories[i];
        let stale = memory.age(snapshot.turn_count) > STALE_AGE_TURNS
            || memory
                .related_entities
                .iter()
                .any(|name| recent.contains(name));
        if stale {
            let memory = &mut next.memories[i];
            memory.last_accessed_turn = snapshot.turn_count;
            enhancer::enhance(memory, &snapshot);
            report.refreshed += 1;
        }
    }
    for &i in &dropped {
        next.memories[i].archived = true;
    }
    report.kept = kept.len();
    report.archived = dropped.len();

    report.tokens_saved = footprint_before.saturating_sub(context_footprint(&next));
    next.last_cleanup_turn = Some(next.turn_count);

    info!(
        kept = report.kept,
        archived = report.archived,
        refreshed = report.refreshed,
        generated = report.generated,
        tokens_saved = report.tokens_saved,
        compressed = report.segment.is_some(),
        "cleanup pass applied"
    );
    Ok((next, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{HistoryRole, Memory, MemorySource};

    fn small_config() -> CleanupConfig {
        CleanupConfig {
            max_active_memories: 10,
            memory_count_threshold: 8,
            low_importance_count_threshold: 3,
            max_active_history: 5,
            history_compression_threshold: 10,
            token_budget: 1_000,
            memory_token_share: 0.4,
            ..Default::default()
        }
    }

    fn state_with_memories(count: usize, turn: u64) -> GameState {
        let mut state = GameState::new("Lý Thanh Vân");
        state.turn_count = turn;
        for i in 0..count {
            state.memories.push(Memory::new(
                format!("ký ức thứ {i} về chuyến hành trình dài qua núi"),
                MemorySource::Generated,
                0,
            ));
        }
        state
    }

    #[test]
    fn test_noop_when_under_thresholds() {
        let state = state_with_memories(2, 3);
        let (next, report) = run_cleanup(&state, &small_config()).unwrap();
        assert!(!report.ran);
        assert_eq!(next.memories.len(), 2);
        assert!(next.memories.iter().all(|m| !m.archived));
        assert_eq!(next.last_cleanup_turn, None);
    }

    #[test]
    fn test_runs_at_most_once_per_turn() {
        let state = state_with_memories(20, 3);
        let (next, first) = run_cleanup(&state, &small_config()).unwrap();
        assert!(first.ran);
        assert_eq!(next.last_cleanup_turn, Some(3));

        let (again, second) = run_cleanup(&next, &small_config()).unwrap();
        assert!(!second.ran);
        assert_eq!(
            again.memories.iter().filter(|m| m.archived).count(),
            next.memories.iter().filter(|m| m.archived).count()
        );
    }

    #[test]
    fn test_ceiling_and_budget_hold() {
        let config = small_config();
        let state = state_with_memories(30, 5);
        let (next, report) = run_cleanup(&state, &config).unwrap();

        let kept: Vec<_> = next.memories.iter().filter(|m| !m.archived).collect();
        assert!(report.ran);
        assert_eq!(kept.len(), report.kept);
        assert!(kept.len() <= config.max_active_memories);
        let spent: usize = kept.iter().map(|m| memory_tokens(m)).sum();
        assert!(spent <= config.memory_token_budget());
        assert!(report.tokens_saved > 0);
    }

    #[test]
    fn test_pinned_survives_low_importance() {
        let mut state = state_with_memories(12, 50);
        // Everything is ancient, so importance is low across the board.
        state.memories[0].pinned = true;
        let pinned_id = state.memories[0].id;

        let (next, report) = run_cleanup(&state, &small_config()).unwrap();
        assert!(report.ran);
        let pinned = next.memories.iter().find(|m| m.id == pinned_id).unwrap();
        assert!(!pinned.archived);
    }

    #[test]
    fn test_pinned_overflow_force_archived() {
        let mut state = state_with_memories(12, 5);
        for memory in state.memories.iter_mut() {
            memory.pinned = true;
        }
        let config = CleanupConfig {
            max_active_memories: 4,
            memory_count_threshold: 3,
            ..small_config()
        };
        let (next, _) = run_cleanup(&state, &config).unwrap();
        assert_eq!(next.memories.iter().filter(|m| !m.archived).count(), 4);
        assert!(next.memories.iter().any(|m| m.pinned && m.archived));
    }

    #[test]
    fn test_history_trigger_compresses() {
        let mut state = GameState::new("Lý Thanh Vân");
        for turn in 0..12 {
            state.turn_count = turn;
            state.push_history(
                HistoryRole::Model,
                format!(
                    "diễn biến lượt {turn}: hắn men theo sơn đạo, vượt qua khe núi, \
                     nghỉ chân bên suối rồi tiếp tục hành trình về phía tông môn xa xôi"
                ),
            );
        }
        let config = small_config();
        let (next, report) = run_cleanup(&state, &config).unwrap();

        assert!(report.ran);
        let segment = report.segment.expect("history should fold");
        assert_eq!(next.history.len(), config.max_active_history);
        assert_eq!(segment.first_turn, 0);
        assert!(report.tokens_saved > 0);
    }

    #[test]
    fn test_stale_kept_memory_is_refreshed() {
        let mut state = state_with_memories(12, 40);
        // A recent, high-value memory that will be kept but is stale by age.
        let mut keeper = Memory::new(
            "hắn đột phá cảnh giới sau trận tử chiến",
            MemorySource::Chronicle,
            2,
        );
        keeper.pinned = true;
        state.memories.push(keeper);

        let (next, report) = run_cleanup(&state, &small_config()).unwrap();
        assert!(report.refreshed >= 1);
        let refreshed = next.memories.iter().find(|m| m.pinned).unwrap();
        assert_eq!(refreshed.last_accessed_turn, 40);
    }

    #[test]
    fn test_validate_rejects_bad_share() {
        let config = CleanupConfig {
            memory_token_share: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CleanupError::BadTokenShare(_))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_history_bounds() {
        let config = CleanupConfig {
            max_active_history: 60,
            history_compression_threshold: 50,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
