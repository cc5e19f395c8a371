//! Importance scoring for long-term memories.
//!
//! Importance is recomputed from current state before every ranking pass, so
//! the stored value is a cache, never an input. The score blends a category
//! baseline, recency decay, and how many of the memory's related entities are
//! still alive in the world. Pinned memories get a floor so they never look
//! disposable even when old.

use crate::world::{GameState, Memory, MemoryCategory};

/// Baseline salience per category.
fn category_weight(category: MemoryCategory) -> f32 {
    match category {
        MemoryCategory::Achievement => 55.0,
        MemoryCategory::Discovery => 48.0,
        MemoryCategory::Combat => 45.0,
        MemoryCategory::Relationship => 42.0,
        MemoryCategory::Event => 38.0,
        MemoryCategory::General => 25.0,
    }
}

/// Recency bonus, decaying geometrically with turns since last access.
fn recency_bonus(age: u64) -> f32 {
    const FRESH_BONUS: f32 = 30.0;
    const DECAY_PER_TURN: f32 = 0.88;
    FRESH_BONUS * DECAY_PER_TURN.powi(age.min(200) as i32)
}

/// Bonus for related entities still present in the world, capped so a memory
/// name-dropping the whole cast does not dominate.
fn entity_bonus(memory: &Memory, state: &GameState) -> f32 {
    const PER_ENTITY: f32 = 5.0;
    const CAP: f32 = 20.0;
    let live = memory
        .related_entities
        .iter()
        .filter(|name| state.find_entity(name).is_some())
        .count();
    (live as f32 * PER_ENTITY).min(CAP)
}

/// Floor applied to pinned memories.
const PINNED_FLOOR: f32 = 60.0;

/// Compute the current importance of a memory, 0-100.
pub fn score(memory: &Memory, state: &GameState) -> f32 {
    let mut value = category_weight(memory.category)
        + recency_bonus(memory.age(state.turn_count))
        + entity_bonus(memory, state);
    if memory.pinned {
        value = value.max(PINNED_FLOOR);
    }
    value.clamp(0.0, 100.0)
}

/// Recompute and store importance for every non-archived memory.
pub fn rescore_all(state: &mut GameState) {
    let snapshot = state.clone();
    for memory in state.memories.iter_mut().filter(|m| !m.archived) {
        memory.importance = score(memory, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemorySource;

    fn state_at_turn(turn: u64) -> GameState {
        let mut state = GameState::new("Lý Thanh Vân");
        state.turn_count = turn;
        state
    }

    #[test]
    fn test_fresh_beats_stale() {
        let state = state_at_turn(20);
        let fresh = Memory::new("vừa xảy ra", MemorySource::Generated, 20);
        let mut stale = Memory::new("chuyện cũ", MemorySource::Generated, 1);
        stale.last_accessed_turn = 1;
        assert!(score(&fresh, &state) > score(&stale, &state));
    }

    #[test]
    fn test_category_ordering() {
        let state = state_at_turn(5);
        let achievement = Memory::new("đột phá", MemorySource::Generated, 5)
            .with_category(MemoryCategory::Achievement);
        let general = Memory::new("ghi chú", MemorySource::Generated, 5);
        assert!(score(&achievement, &state) > score(&general, &state));
    }

    #[test]
    fn test_pinned_floor_holds_for_ancient_memory() {
        let state = state_at_turn(500);
        let mut pinned = Memory::new("lời thề", MemorySource::Chronicle, 0);
        pinned.pinned = true;
        assert!(score(&pinned, &state) >= 60.0);

        let mut unpinned = pinned.clone();
        unpinned.pinned = false;
        assert!(score(&unpinned, &state) < 60.0);
    }

    #[test]
    fn test_live_entity_bonus() {
        let mut state = state_at_turn(3);
        state.insert_entity(crate::world::Entity::new(
            crate::world::EntityKind::Npc,
            "Trần Phong",
        ));
        let mut linked = Memory::new("gặp Trần Phong", MemorySource::Generated, 3);
        linked.related_entities.push("Trần Phong".to_string());
        let unlinked = Memory::new("gặp ai đó", MemorySource::Generated, 3);
        assert!(score(&linked, &state) > score(&unlinked, &state));
    }

    #[test]
    fn test_score_bounded() {
        let state = state_at_turn(0);
        let mut memory = Memory::new("x", MemorySource::Generated, 0)
            .with_category(MemoryCategory::Achievement);
        memory.pinned = true;
        memory.related_entities = (0..50).map(|i| format!("e{i}")).collect();
        let value = score(&memory, &state);
        assert!((0.0..=100.0).contains(&value));
    }
}
