//! Smart memory generation.
//!
//! Mines the recent history window for beats worth remembering that no
//! CHRONICLE_TURN tag captured. Entirely deterministic: the same state and
//! config always yield the same memories, so replays stay reproducible.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::enhancer;
use crate::world::{GameState, HistoryRole, Memory, MemoryCategory, MemorySource};

/// Per-category opt-outs for generated memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryToggles {
    pub event: bool,
    pub relationship: bool,
    pub discovery: bool,
    pub combat: bool,
    pub achievement: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            event: true,
            relationship: true,
            discovery: true,
            combat: true,
            achievement: true,
        }
    }
}

impl CategoryToggles {
    fn allows(&self, category: MemoryCategory) -> bool {
        match category {
            MemoryCategory::Event => self.event,
            MemoryCategory::Relationship => self.relationship,
            MemoryCategory::Discovery => self.discovery,
            MemoryCategory::Combat => self.combat,
            MemoryCategory::Achievement => self.achievement,
            // Nothing classified General is ever worth generating.
            MemoryCategory::General => false,
        }
    }
}

/// Tuning for the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartMemoryConfig {
    /// Master switch; off means `generate` returns nothing.
    pub enabled: bool,
    /// How many trailing history entries to scan.
    pub window: usize,
    /// Hard cap on memories produced per invocation.
    pub max_per_run: usize,
    /// Candidates scoring below this after enhancement are dropped.
    pub min_importance: f32,
    pub categories: CategoryToggles,
}

impl Default for SmartMemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 8,
            max_per_run: 3,
            min_importance: 30.0,
            categories: CategoryToggles::default(),
        }
    }
}

/// Longest excerpt carried into a generated memory.
const MAX_EXCERPT_CHARS: usize = 200;

/// First sentence of the text, or a char-bounded prefix when the text runs on.
fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    let sentence_end = trimmed
        .char_indices()
        .find(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, c)| i + c.len_utf8());
    let cut = match sentence_end {
        Some(end) if trimmed[..end].chars().count() >= 20 => end,
        _ => trimmed
            .char_indices()
            .nth(MAX_EXCERPT_CHARS)
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len()),
    };
    trimmed[..cut].trim().to_string()
}

/// Scan the recent history window and synthesize memories for notable beats.
///
/// Only model-authored entries are considered; the player's own inputs are
/// not narrative. Candidates already present verbatim among stored memories
/// are skipped so repeated runs over the same window stay idempotent.
pub fn generate(state: &GameState, config: &SmartMemoryConfig) -> Vec<Memory> {
    if !config.enabled || config.window == 0 || config.max_per_run == 0 {
        return Vec::new();
    }

    let start = state.history.len().saturating_sub(config.window);
    let mut candidates: Vec<Memory> = Vec::new();
    for entry in &state.history[start..] {
        if entry.role != HistoryRole::Model {
            continue;
        }
        let text = excerpt(&entry.text);
        if text.is_empty() {
            continue;
        }
        let category = enhancer::classify(&text);
        if !config.categories.allows(category) {
            continue;
        }
        if state.memories.iter().any(|m| m.text == text)
            || candidates.iter().any(|m| m.text == text)
        {
            continue;
        }
        let mut memory =
            Memory::new(text, MemorySource::Generated, state.turn_count).with_category(category);
        enhancer::enhance(&mut memory, state);
        if memory.importance >= config.min_importance {
            candidates.push(memory);
        }
    }

    // Highest importance first; stable sort keeps window order on ties.
    candidates.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(config.max_per_run);
    debug!(generated = candidates.len(), "smart memory pass");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_history(lines: &[&str]) -> GameState {
        let mut state = GameState::new("Lý Thanh Vân");
        state.turn_count = 10;
        for line in lines {
            state.push_history(HistoryRole::Model, *line);
        }
        state
    }

    #[test]
    fn test_disabled_generates_nothing() {
        let state = state_with_history(&["Hắn đột phá Trúc Cơ kỳ trong đêm mưa."]);
        let config = SmartMemoryConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(generate(&state, &config).is_empty());
    }

    #[test]
    fn test_notable_beat_becomes_memory() {
        let state = state_with_history(&[
            "Gió thổi qua sơn cốc.",
            "Hắn đột phá Trúc Cơ kỳ trong đêm mưa lớn.",
        ]);
        let memories = generate(&state, &SmartMemoryConfig::default());
        assert!(memories
            .iter()
            .any(|m| m.category == MemoryCategory::Achievement));
        for memory in &memories {
            assert_eq!(memory.source, MemorySource::Generated);
            assert!(memory.importance >= 30.0);
        }
    }

    #[test]
    fn test_max_per_run_caps_output() {
        let state = state_with_history(&[
            "Trận chiến đấu thứ nhất nổ ra dữ dội nơi cốc khẩu.",
            "Trận chiến đấu thứ hai nổ ra dữ dội nơi sườn núi.",
            "Trận chiến đấu thứ ba nổ ra dữ dội nơi đỉnh phong.",
            "Trận chiến đấu thứ tư nổ ra dữ dội nơi bờ suối.",
        ]);
        let config = SmartMemoryConfig {
            max_per_run: 2,
            ..Default::default()
        };
        assert_eq!(generate(&state, &config).len(), 2);
    }

    #[test]
    fn test_category_toggle_filters() {
        let state = state_with_history(&["Trận chiến đấu nổ ra dữ dội nơi cốc khẩu."]);
        let config = SmartMemoryConfig {
            categories: CategoryToggles {
                combat: false,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(generate(&state, &config).is_empty());
    }

    #[test]
    fn test_existing_memory_not_duplicated() {
        let mut state = state_with_history(&["Hắn đột phá Trúc Cơ kỳ trong đêm mưa lớn."]);
        let first = generate(&state, &SmartMemoryConfig::default());
        assert_eq!(first.len(), 1);
        state.memories.extend(first);
        let second = generate(&state, &SmartMemoryConfig::default());
        assert!(second.is_empty());
    }

    #[test]
    fn test_excerpt_cuts_at_first_sentence() {
        let text = "Hắn đánh bại đối thủ ngay chiêu đầu tiên. Sau đó trời mưa.";
        assert_eq!(excerpt(text), "Hắn đánh bại đối thủ ngay chiêu đầu tiên.");
    }
}
