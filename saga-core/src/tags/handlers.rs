//! Per-kind tag handlers.
//!
//! Every handler is total: a missing target, an absent attribute, or an
//! unparseable value degrades to "no effect for this tag" and the snapshot
//! stays valid. Upstream narrative is machine-generated and occasionally
//! malformed, so nothing here may abort the turn.

use crate::memory::enhancer;
use crate::progression::{sync_realm, REALM_TIERS};
use crate::tags::attrs::TagAttrs;
use crate::tags::kind::TagKind;
use crate::tags::skills::{self, SkillMerge};
use crate::world::{
    ChronicleEntry, Entity, EntityKind, GameState, Memory, MemorySource, Objective, Quest,
    QuestStatus, Status, StatusKind,
};

/// Apply one recognized tag to the snapshot.
pub fn apply_tag(
    state: &mut GameState,
    kind: TagKind,
    attrs: &TagAttrs,
    narrative: &str,
    events: &mut Vec<String>,
) {
    match kind {
        TagKind::TimeElapsed => time_elapsed(state, attrs, events),
        TagKind::ChronicleTurn => chronicle(state, attrs, ChronicleLog::Turn, events),
        TagKind::ChronicleChapter => chronicle(state, attrs, ChronicleLog::Chapter, events),
        TagKind::ChronicleMemoir => chronicle(state, attrs, ChronicleLog::Memoir, events),
        TagKind::StatusAppliedSelf => status_applied(state, attrs, true, events),
        TagKind::StatusApplied => status_applied(state, attrs, false, events),
        TagKind::StatusCuredSelf => status_cured(state, attrs, true, events),
        TagKind::StatusCured => status_cured(state, attrs, false, events),
        // A character tag about the player merges into the existing player
        // record; anyone new enters the world as an NPC.
        TagKind::LoreCharacter => lore(state, attrs, EntityKind::Npc, events),
        TagKind::LoreNpc => lore(state, attrs, EntityKind::Npc, events),
        TagKind::LoreItem => lore(state, attrs, EntityKind::Item, events),
        TagKind::LoreSkill => lore(state, attrs, EntityKind::Skill, events),
        TagKind::LoreLocation => lore(state, attrs, EntityKind::Location, events),
        TagKind::LoreFaction => lore(state, attrs, EntityKind::Faction, events),
        TagKind::LoreConcept => lore(state, attrs, EntityKind::Concept, events),
        TagKind::SkillExpGain => skill_exp_gain(state, attrs, events),
        TagKind::Breakthrough => breakthrough(state, attrs, events),
        TagKind::SkillLearned => skill_learned(state, attrs, narrative, events),
        TagKind::SkillUpgraded => skill_learned(state, attrs, narrative, events),
        TagKind::EntityUpdate => entity_update(state, attrs, events),
        TagKind::StatChanged => stat_changed(state, attrs, events),
        TagKind::ItemAcquired => item_acquired(state, attrs, events),
        TagKind::ItemConsumed => item_consumed(state, attrs, events),
        TagKind::ItemEquipped => item_equip(state, attrs, true, events),
        TagKind::ItemUnequipped => item_equip(state, attrs, false, events),
        TagKind::ItemTransformed => item_transformed(state, attrs, events),
        TagKind::ItemDamaged => item_durability(state, attrs, -1.0, events),
        TagKind::ItemRepaired => item_durability(state, attrs, 1.0, events),
        TagKind::ItemDiscarded => item_discarded(state, attrs, events),
        TagKind::CompanionJoined => companion_joined(state, attrs, events),
        TagKind::CompanionLeft => companion_left(state, attrs, events),
        TagKind::RelationshipChanged => relationship_changed(state, attrs, events),
        TagKind::QuestAssigned => quest_assigned(state, attrs, events),
        TagKind::QuestUpdated => quest_updated(state, attrs, events),
        TagKind::QuestObjectiveCompleted => quest_objective_completed(state, attrs, events),
        TagKind::QuestCompleted => quest_completed(state, attrs, events),
        TagKind::QuestFailed => quest_failed(state, attrs, events),
        TagKind::MemoryPinned => memory_pinned(state, attrs, events),
        TagKind::Narration => {}
    }
}

// =============================================================================
// Time and chronicle
// =============================================================================

fn time_elapsed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let years = attrs.number("years").unwrap_or(0.0).max(0.0) as u32;
    let months = attrs.number("months").unwrap_or(0.0).max(0.0) as u32;
    let days = attrs.number("days").unwrap_or(0.0).max(0.0) as u32;
    let hours = attrs.number("hours").unwrap_or(0.0).max(0.0) as u32;
    let minutes = attrs.number("minutes").unwrap_or(0.0).max(0.0) as u32;

    if years + months + days + hours + minutes == 0 {
        return;
    }
    state.time.advance_years(years);
    state.time.advance_months(months);
    state.time.advance_days(days);
    state.time.advance_hours(hours);
    state.time.advance_minutes(minutes);
    events.push(format!("Time advanced to {}", state.time));
}

enum ChronicleLog {
    Turn,
    Chapter,
    Memoir,
}

fn chronicle(
    state: &mut GameState,
    attrs: &TagAttrs,
    log: ChronicleLog,
    events: &mut Vec<String>,
) {
    let Some(text) = attrs
        .text("text")
        .or_else(|| attrs.text("entry"))
        .or_else(|| attrs.text("content"))
    else {
        return;
    };
    let entry = ChronicleEntry {
        text: text.to_string(),
        turn: state.turn_count,
        time: state.time.clone(),
    };
    match log {
        ChronicleLog::Turn => {
            state.chronicle.turns.push(entry);
            // Turn-level beats double as long-term memories.
            let mut memory = Memory::new(text, MemorySource::Chronicle, state.turn_count);
            enhancer::enhance(&mut memory, state);
            events.push(format!("Remembered: {}", memory.text));
            state.memories.push(memory);
        }
        ChronicleLog::Chapter => state.chronicle.chapters.push(entry),
        ChronicleLog::Memoir => state.chronicle.memoirs.push(entry),
    }
}

// =============================================================================
// Statuses
// =============================================================================

fn status_owner(state: &GameState, attrs: &TagAttrs, on_self: bool) -> String {
    if on_self {
        return state.player_name.clone();
    }
    attrs
        .text("target")
        .or_else(|| attrs.text("owner"))
        .map(str::to_string)
        .unwrap_or_else(|| state.player_name.clone())
}

fn status_applied(state: &mut GameState, attrs: &TagAttrs, on_self: bool, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let owner = status_owner(state, attrs, on_self);
    let kind = StatusKind::parse(attrs.text("type").unwrap_or("debuff"));
    let status = Status {
        owner: owner.clone(),
        name: name.to_string(),
        kind,
        duration: attrs.display("duration"),
        applied_turn: state.turn_count,
    };
    state.apply_status(status);
    events.push(format!("{owner} gained {} ({})", name, kind.name()));
}

fn status_cured(state: &mut GameState, attrs: &TagAttrs, on_self: bool, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let owner = status_owner(state, attrs, on_self);
    let before = state.statuses.len();
    state.remove_status(&owner, name);
    if state.statuses.len() < before {
        events.push(format!("{owner} recovered from {name}"));
    }
}

// =============================================================================
// Lore creation
// =============================================================================

/// Merge-if-exists, create-if-absent. Existing records keep their id and name;
/// incoming attributes overwrite field by field.
fn lore(state: &mut GameState, attrs: &TagAttrs, kind: EntityKind, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let name = name.to_string();

    if let Some(existing) = state.find_entity_mut(&name) {
        for (key, value) in attrs.iter() {
            if key != "name" {
                existing.attributes.insert(key.to_string(), value.clone());
            }
        }
        sync_realm(existing, &REALM_TIERS);
        events.push(format!("Updated lore for {}", existing.name));
        return;
    }

    let mut entity = Entity::new(kind, name.clone());
    for (key, value) in attrs.iter() {
        if key != "name" {
            entity.attributes.insert(key.to_string(), value.clone());
        }
    }
    sync_realm(&mut entity, &REALM_TIERS);
    state.insert_entity(entity);
    events.push(format!("Discovered {}: {name}", kind.name()));
}

// =============================================================================
// Skills
// =============================================================================

fn skill_exp_gain(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name").or_else(|| attrs.text("skill")) else {
        return;
    };
    let amount = attrs.number("amount").unwrap_or(0.0);
    if amount == 0.0 {
        return;
    }
    let name = name.to_string();
    let Some(skill) = state.find_entity_mut(&name) else {
        tracing::debug!(skill = %name, "exp gain for unknown skill ignored");
        return;
    };
    let exp = skill.number("exp").unwrap_or(0.0) + amount;
    skill.set_attr("exp", exp);
    events.push(format!("{name} gained {amount} exp"));
}

/// A breakthrough pushes a cultivator across the next realm boundary. With an
/// explicit amount the experience simply increases; without one, experience
/// jumps to the next tier's floor. The realm itself stays derived.
fn breakthrough(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let target = attrs
        .text("target")
        .or_else(|| attrs.text("name"))
        .map(str::to_string)
        .unwrap_or_else(|| state.player_name.clone());
    let Some(entity) = state.find_entity_mut(&target) else {
        return;
    };
    let current = entity.number("exp").unwrap_or(0.0);
    let new_exp = match attrs.number("amount") {
        Some(amount) => current + amount,
        None => REALM_TIERS
            .iter()
            .map(|t| t.min_exp)
            .find(|&min| min > current)
            .unwrap_or(current),
    };
    entity.set_attr("exp", new_exp);
    sync_realm(entity, &REALM_TIERS);
    let realm = entity.text("realm").unwrap_or("").to_string();
    events.push(format!("{} broke through to {realm}", entity.name));
}

fn skill_learned(
    state: &mut GameState,
    attrs: &TagAttrs,
    narrative: &str,
    events: &mut Vec<String>,
) {
    let Some(name) = attrs.text("name").or_else(|| attrs.text("skill")) else {
        return;
    };
    let name = name.to_string();
    let (learner, _step) = skills::resolve_learner(state, attrs, narrative);

    let surviving = match skills::merge_skill(state, &name) {
        SkillMerge::Created | SkillMerge::Specialized { .. } => {
            let mut skill = Entity::new(EntityKind::Skill, name.clone());
            for (key, value) in attrs.iter() {
                if !matches!(key, "name" | "skill" | "target" | "learner" | "character") {
                    skill.attributes.insert(key.to_string(), value.clone());
                }
            }
            state.insert_entity(skill);
            name.clone()
        }
        SkillMerge::Replaced { .. } => name.clone(),
        SkillMerge::AlreadyKnown { existing } => existing,
    };

    if let Some(holder) = state.find_entity_mut(&learner) {
        let mut held = holder.skill_names();
        if !held.iter().any(|s| s.eq_ignore_ascii_case(&surviving)) {
            held.push(surviving.clone());
            holder.set_skill_names(&held);
        }
    }
    events.push(format!("{learner} learned {surviving}"));
}

// =============================================================================
// Generic updates
// =============================================================================

/// Absolute field replacement on a named entity.
fn entity_update(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name").or_else(|| attrs.text("target")) else {
        return;
    };
    let name = name.to_string();
    let mut exp_changed = false;
    {
        let Some(entity) = state.find_entity_mut(&name) else {
            return;
        };
        for (key, value) in attrs.iter() {
            if matches!(key, "name" | "target" | "rename") {
                continue;
            }
            exp_changed |= key == "exp";
            entity.attributes.insert(key.to_string(), value.clone());
        }
        if exp_changed {
            sync_realm(entity, &REALM_TIERS);
        }
    }
    if let Some(new_name) = attrs.text("rename") {
        state.rename_entity(&name, new_name);
    }
    events.push(format!("Updated {name}"));
}

/// Signed incremental delta through an attribute/change pair.
fn stat_changed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("target").or_else(|| attrs.text("name")) else {
        return;
    };
    let Some(stat) = attrs.text("attribute").or_else(|| attrs.text("stat")) else {
        return;
    };
    let Some(change) = attrs.number("change") else {
        return;
    };
    let name = name.to_string();
    let stat = stat.to_string();
    let Some(entity) = state.find_entity_mut(&name) else {
        return;
    };
    let current = entity.number(&stat).unwrap_or(0.0);
    entity.set_attr(stat.as_str(), current + change);
    if stat == "exp" {
        sync_realm(entity, &REALM_TIERS);
    }
    events.push(format!("{name}: {stat} {change:+}"));
}

// =============================================================================
// Inventory
// =============================================================================

fn item_acquired(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let name = name.to_string();
    let incoming = attrs.number("quantity").unwrap_or(1.0).max(1.0);

    if let Some(existing) = state.find_entity_mut(&name) {
        if existing.kind == EntityKind::Item && existing.is_stackable() {
            let total = existing.quantity() + incoming;
            existing.set_attr("quantity", total);
            events.push(format!("Acquired {name} x{incoming} (now {total})"));
        } else {
            // Existing records keep their id and kind; incoming attributes
            // layer on, same as lore merges. Entities are only ever removed
            // by explicit discard, consume-to-zero, or rename.
            for (key, value) in attrs.iter() {
                if key != "name" {
                    existing.attributes.insert(key.to_string(), value.clone());
                }
            }
            events.push(format!("Acquired {name}"));
        }
        return;
    }

    let mut item = Entity::new(EntityKind::Item, name.clone());
    for (key, value) in attrs.iter() {
        if key != "name" {
            item.attributes.insert(key.to_string(), value.clone());
        }
    }
    if item.attr("quantity").is_none() && incoming > 1.0 {
        item.set_attr("quantity", incoming);
    }
    if item.text("owner").is_none() {
        item.set_attr("owner", state.player_name.as_str());
    }
    state.insert_entity(item);
    events.push(format!("Acquired {name}"));
}

fn item_consumed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let name = name.to_string();
    let consumed = attrs.number("quantity").unwrap_or(1.0).max(1.0);
    let Some(item) = state.find_entity_mut(&name) else {
        return;
    };
    let held = item.quantity();
    if consumed >= held {
        state.remove_entity(&name);
        events.push(format!("Used up {name}"));
    } else {
        item.set_attr("quantity", held - consumed);
        events.push(format!("Consumed {name} x{consumed}"));
    }
}

fn item_equip(state: &mut GameState, attrs: &TagAttrs, equipped: bool, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let name = name.to_string();
    let owner = attrs
        .text("target")
        .or_else(|| attrs.text("owner"))
        .map(str::to_string)
        .unwrap_or_else(|| state.player_name.clone());
    let Some(item) = state.find_entity_mut(&name) else {
        return;
    };
    item.set_attr("equipped", equipped);
    if equipped {
        item.set_attr("owner", owner.as_str());
        events.push(format!("{owner} equipped {name}"));
    } else {
        events.push(format!("{owner} unequipped {name}"));
    }
}

fn item_transformed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let Some(into) = attrs.text("into").or_else(|| attrs.text("to")) else {
        return;
    };
    let name = name.to_string();
    let into = into.to_string();
    if state.find_entity(&name).is_none() {
        return;
    }
    state.rename_entity(&name, &into);
    if let Some(item) = state.find_entity_mut(&into) {
        for (key, value) in attrs.iter() {
            if !matches!(key, "name" | "into" | "to") {
                item.attributes.insert(key.to_string(), value.clone());
            }
        }
    }
    events.push(format!("{name} transformed into {into}"));
}

fn item_durability(state: &mut GameState, attrs: &TagAttrs, sign: f64, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let name = name.to_string();
    let amount = attrs.number("amount").unwrap_or(1.0).abs();
    let Some(item) = state.find_entity_mut(&name) else {
        return;
    };
    let current = item.number("durability").unwrap_or(100.0);
    let updated = (current + sign * amount).max(0.0);
    item.set_attr("durability", updated);
    if sign < 0.0 {
        events.push(format!("{name} damaged (durability {updated})"));
    } else {
        events.push(format!("{name} repaired (durability {updated})"));
    }
}

fn item_discarded(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    if state.remove_entity(name).is_some() {
        events.push(format!("Discarded {name}"));
    }
}

// =============================================================================
// Companions and relationships
// =============================================================================

fn companion_joined(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let name = name.to_string();

    match state.find_entity_mut(&name) {
        Some(existing) => {
            existing.kind = EntityKind::Companion;
            for (key, value) in attrs.iter() {
                if key != "name" {
                    existing.attributes.insert(key.to_string(), value.clone());
                }
            }
        }
        None => {
            let mut companion = Entity::new(EntityKind::Companion, name.clone());
            for (key, value) in attrs.iter() {
                if key != "name" {
                    companion.attributes.insert(key.to_string(), value.clone());
                }
            }
            state.insert_entity(companion);
        }
    }

    let canonical = state.canonical_name(&name).unwrap_or(name);
    if !state.party.iter().any(|m| m.eq_ignore_ascii_case(&canonical)) {
        state.party.push(canonical.clone());
    }
    events.push(format!("{canonical} joined the party"));
}

fn companion_left(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("name") else {
        return;
    };
    let before = state.party.len();
    state.party.retain(|m| !m.eq_ignore_ascii_case(name));
    if state.party.len() < before {
        // The record survives as an NPC the story can return to.
        if let Some(entity) = state.find_entity_mut(name) {
            entity.kind = EntityKind::Npc;
        }
        events.push(format!("{name} left the party"));
    }
}

fn relationship_changed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(name) = attrs.text("target").or_else(|| attrs.text("name")) else {
        return;
    };
    let name = name.to_string();
    let Some(entity) = state.find_entity_mut(&name) else {
        return;
    };
    if let Some(change) = attrs.number("change") {
        let current = entity.number("relationship").unwrap_or(0.0);
        entity.set_attr("relationship", current + change);
        events.push(format!("Relationship with {name}: {change:+}"));
    } else if let Some(value) = attrs.text("value") {
        entity.set_attr("relationship_note", value);
        events.push(format!("Relationship with {name}: {value}"));
    }
}

// =============================================================================
// Quests
// =============================================================================

fn quest_assigned(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(title) = attrs.text("title").or_else(|| attrs.text("name")) else {
        return;
    };
    let title = title.to_string();
    let objectives: Vec<Objective> = attrs
        .objectives("objectives")
        .map(|o| o.to_vec())
        .unwrap_or_default();
    let reward = attrs.text("reward").map(str::to_string);

    if let Some(quest) = state.find_quest_mut(&title) {
        if !objectives.is_empty() {
            quest.objectives = objectives;
        }
        if reward.is_some() {
            quest.reward = reward;
        }
        events.push(format!("Quest updated: {title}"));
        return;
    }

    let mut quest = Quest::new(title.clone());
    quest.objectives = objectives;
    quest.reward = reward;
    state.quests.push(quest);
    events.push(format!("Quest accepted: {title}"));
}

fn quest_updated(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(title) = attrs.text("title").or_else(|| attrs.text("name")) else {
        return;
    };
    let title = title.to_string();
    let objectives = attrs.objectives("objectives").map(|o| o.to_vec());
    let reward = attrs.text("reward").map(str::to_string);
    let status = attrs.text("status").map(|s| s.to_lowercase());

    let Some(quest) = state.find_quest_mut(&title) else {
        return;
    };
    if let Some(objectives) = objectives {
        quest.objectives = objectives;
    }
    if reward.is_some() {
        quest.reward = reward;
    }
    match status.as_deref() {
        Some("completed") => quest.status = QuestStatus::Completed,
        Some("failed") => quest.status = QuestStatus::Failed,
        Some("active") => quest.status = QuestStatus::Active,
        _ => {}
    }
    events.push(format!("Quest updated: {title}"));
}

fn quest_objective_completed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(title) = attrs.text("title").or_else(|| attrs.text("quest")) else {
        return;
    };
    let Some(which) = attrs.text("objective") else {
        return;
    };
    let title = title.to_string();
    let which_lower = which.to_lowercase();
    let Some(quest) = state.find_quest_mut(&title) else {
        return;
    };
    for objective in &mut quest.objectives {
        if objective.description.to_lowercase().contains(&which_lower) {
            objective.completed = true;
            events.push(format!("Objective done: {}", objective.description));
            break;
        }
    }
}

fn quest_completed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(title) = attrs.text("title").or_else(|| attrs.text("name")) else {
        return;
    };
    let title = title.to_string();
    let reward_text = {
        let Some(quest) = state.find_quest_mut(&title) else {
            return;
        };
        quest.status = QuestStatus::Completed;
        for objective in &mut quest.objectives {
            objective.completed = true;
        }
        attrs
            .text("reward")
            .map(str::to_string)
            .or_else(|| quest.reward.clone())
    };

    events.push(format!("Quest completed: {title}"));

    // Reward text is free-form ("500 linh thạch"); a leading numeric amount
    // is credited to the player automatically.
    if let Some(reward) = reward_text {
        if let Some(amount) = parse_reward_amount(&reward) {
            if let Some(player) = state.player_mut() {
                let money = player.number("money").unwrap_or(0.0) + amount;
                player.set_attr("money", money);
                events.push(format!("Reward: {reward} (+{amount})"));
            }
        }
    }
}

fn quest_failed(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(title) = attrs.text("title").or_else(|| attrs.text("name")) else {
        return;
    };
    let title = title.to_string();
    if let Some(quest) = state.find_quest_mut(&title) {
        quest.status = QuestStatus::Failed;
        events.push(format!("Quest failed: {title}"));
    }
}

/// First run of digits in free text, read as an amount.
fn parse_reward_amount(text: &str) -> Option<f64> {
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            if c == ',' || c == '.' {
                // Thousands separators inside a number are dropped.
                continue;
            }
            break;
        }
    }
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

// =============================================================================
// Memory
// =============================================================================

fn memory_pinned(state: &mut GameState, attrs: &TagAttrs, events: &mut Vec<String>) {
    let Some(text) = attrs.text("text").or_else(|| attrs.text("match")) else {
        return;
    };
    let needle = text.to_lowercase();
    for memory in &mut state.memories {
        if memory.text.to_lowercase().contains(&needle) {
            memory.pinned = true;
            events.push(format!("Pinned memory: {}", memory.text));
        }
    }
}
