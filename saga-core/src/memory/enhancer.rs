//! Memory enrichment.
//!
//! Raw memory text arrives as a bare sentence from a chronicle beat or a
//! history excerpt. Enhancement classifies it into a category, extracts
//! keyword tags, links it to entities the world already knows, and rescores
//! its importance. Everything is keyword-driven and deterministic; the tables
//! carry both Vietnamese and English because generated narrative mixes the
//! two freely.

use lazy_static::lazy_static;
use tracing::debug;

use crate::memory::scorer;
use crate::world::{GameState, Memory, MemoryCategory};

lazy_static! {
    /// Category cue words, checked in priority order. The first category with
    /// a hit wins; text matching nothing stays where it was.
    static ref CATEGORY_CUES: Vec<(MemoryCategory, Vec<&'static str>)> = vec![
        (
            MemoryCategory::Achievement,
            vec![
                "đột phá", "thành tựu", "đạt tới", "hoàn thành", "lĩnh ngộ",
                "breakthrough", "achieved", "mastered", "ascended",
            ],
        ),
        (
            MemoryCategory::Combat,
            vec![
                "chiến đấu", "tấn công", "đánh bại", "giao chiến", "tử chiến",
                "bị thương", "battle", "fought", "defeated", "attacked", "wounded",
            ],
        ),
        (
            MemoryCategory::Discovery,
            vec![
                "phát hiện", "khám phá", "tìm thấy", "bí mật", "cổ vật", "di tích",
                "discovered", "found", "uncovered", "secret", "ruin",
            ],
        ),
        (
            MemoryCategory::Relationship,
            vec![
                "kết giao", "kết bạn", "ân oán", "tin tưởng", "phản bội", "sư phụ",
                "đồng hành", "befriended", "betrayed", "trusted", "allied", "rival",
            ],
        ),
        (
            MemoryCategory::Event,
            vec![
                "xảy ra", "biến cố", "đại hội", "nghi lễ", "khởi hành",
                "happened", "arrived", "departed", "ceremony",
            ],
        ),
    ];
}

/// Maximum number of keyword tags attached per memory.
const MAX_TAGS: usize = 5;

/// Classify a piece of text by cue words. Falls back to `General`.
pub fn classify(text: &str) -> MemoryCategory {
    let lower = text.to_lowercase();
    for (category, cues) in CATEGORY_CUES.iter() {
        if cues.iter().any(|cue| lower.contains(cue)) {
            return *category;
        }
    }
    MemoryCategory::General
}

/// Collect the cue words actually present in the text, across all categories.
fn extract_tags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags = Vec::new();
    for (_, cues) in CATEGORY_CUES.iter() {
        for cue in cues {
            if lower.contains(cue) && !tags.iter().any(|t| t == cue) {
                tags.push((*cue).to_string());
                if tags.len() >= MAX_TAGS {
                    return tags;
                }
            }
        }
    }
    tags
}

/// Names of known entities mentioned in the text, in stored casing.
fn mentioned_entities(text: &str, state: &GameState) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut names: Vec<String> = state
        .entities
        .values()
        .filter(|e| lower.contains(&e.name.to_lowercase()))
        .map(|e| e.name.clone())
        .collect();
    names.sort();
    names
}

/// Enrich a memory in place: classify, tag, link entities, rescore.
///
/// Classification never downgrades an explicit category; only memories still
/// marked `General` are reclassified. Entity links and tags are replaced
/// wholesale so a refresh pass picks up renames.
pub fn enhance(memory: &mut Memory, state: &GameState) {
    if memory.category == MemoryCategory::General {
        memory.category = classify(&memory.text);
    }
    memory.tags = extract_tags(&memory.text);
    memory.related_entities = mentioned_entities(&memory.text, state);
    memory.importance = scorer::score(memory, state);
    debug!(
        category = memory.category.name(),
        importance = memory.importance,
        entities = memory.related_entities.len(),
        "enhanced memory"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Entity, EntityKind, MemorySource};

    #[test]
    fn test_classify_bilingual() {
        assert_eq!(classify("Hắn đột phá Trúc Cơ kỳ"), MemoryCategory::Achievement);
        assert_eq!(classify("A fierce battle in the ravine"), MemoryCategory::Combat);
        assert_eq!(classify("Phát hiện di tích cổ"), MemoryCategory::Discovery);
        assert_eq!(classify("Trời hôm nay đẹp"), MemoryCategory::General);
    }

    #[test]
    fn test_achievement_outranks_combat_cue() {
        // Both cue sets match; priority order decides.
        let text = "Sau trận chiến đấu, hắn đột phá cảnh giới";
        assert_eq!(classify(text), MemoryCategory::Achievement);
    }

    #[test]
    fn test_enhance_links_known_entities() {
        let mut state = GameState::new("Lý Thanh Vân");
        state.insert_entity(Entity::new(EntityKind::Npc, "Trần Phong"));
        state.insert_entity(Entity::new(EntityKind::Item, "Thiết Kiếm"));

        let mut memory = Memory::new(
            "Trần Phong trao Thiết Kiếm cho Lý Thanh Vân",
            MemorySource::Chronicle,
            state.turn_count,
        );
        enhance(&mut memory, &state);

        assert!(memory.related_entities.contains(&"Trần Phong".to_string()));
        assert!(memory.related_entities.contains(&"Thiết Kiếm".to_string()));
        assert!(memory.related_entities.contains(&"Lý Thanh Vân".to_string()));
    }

    #[test]
    fn test_enhance_keeps_explicit_category() {
        let state = GameState::new("Lý Thanh Vân");
        let mut memory = Memory::new("đột phá", MemorySource::Generated, 0)
            .with_category(MemoryCategory::Relationship);
        enhance(&mut memory, &state);
        assert_eq!(memory.category, MemoryCategory::Relationship);
    }

    #[test]
    fn test_enhance_sets_importance() {
        let state = GameState::new("Lý Thanh Vân");
        let mut memory = Memory::new("hắn đột phá thành công", MemorySource::Generated, 0);
        enhance(&mut memory, &state);
        assert_eq!(memory.category, MemoryCategory::Achievement);
        assert!(memory.importance > 50.0);
        assert!(!memory.tags.is_empty());
    }
}
