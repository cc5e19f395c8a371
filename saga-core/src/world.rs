//! Game world state.
//!
//! Everything the narrative engine tracks between turns: entities, statuses,
//! quests, memories, turn history, the chronicle, and in-game time. The whole
//! aggregate is one serializable snapshot; handlers clone it, edit the clone,
//! and hand back a new snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A typed attribute value carried by entities and parsed tags.
///
/// Closed set on purpose: the tag language only ever produces these four
/// shapes, and entity attributes reuse the same variants so state stays
/// round-trippable through JSON without an untyped bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Objectives(Vec<Objective>),
}

impl AttrValue {
    /// Get the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean content, if this is a flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttrValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the objective list, if this is one.
    pub fn as_objectives(&self) -> Option<&[Objective]> {
        match self {
            AttrValue::Objectives(list) => Some(list),
            _ => None,
        }
    }

    /// Render the value as display text.
    pub fn display(&self) -> String {
        match self {
            AttrValue::Flag(b) => b.to_string(),
            AttrValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            AttrValue::Text(s) => s.clone(),
            AttrValue::Objectives(list) => list
                .iter()
                .map(|o| o.description.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Flag(b)
    }
}

/// Kinds of entities tracked in the known-entity collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player character.
    Player,
    /// A non-player character.
    Npc,
    /// A party member travelling with the player.
    Companion,
    /// An item, artifact, or piece of equipment.
    Item,
    /// A learned skill or technique.
    Skill,
    /// A place in the world.
    Location,
    /// A sect, clan, or organization.
    Faction,
    /// An abstract piece of lore.
    Concept,
}

impl EntityKind {
    /// Display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player => "Player",
            EntityKind::Npc => "NPC",
            EntityKind::Companion => "Companion",
            EntityKind::Item => "Item",
            EntityKind::Skill => "Skill",
            EntityKind::Location => "Location",
            EntityKind::Faction => "Faction",
            EntityKind::Concept => "Concept",
        }
    }
}

/// An entity in the known-entity collection, keyed by unique name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Stable reference id, generated at creation.
    pub id: Uuid,
    pub kind: EntityKind,
    /// Primary name; unique within [`GameState::entities`].
    pub name: String,
    /// Kind-specific attributes (owner, equipped, durability, exp, realm, ...).
    pub attributes: HashMap<String, AttrValue>,
}

impl Entity {
    /// Create a new entity with a fresh reference id.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttrValue::as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(AttrValue::as_number)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(AttrValue::as_flag)
    }

    /// Current stack quantity. Entities without a quantity count as one.
    pub fn quantity(&self) -> f64 {
        self.number("quantity").unwrap_or(1.0)
    }

    /// Whether acquiring a same-named item should stack onto this record.
    pub fn is_stackable(&self) -> bool {
        self.flag("stackable").unwrap_or(self.attr("quantity").is_some())
    }

    /// Check if a name matches this entity (case-insensitive).
    pub fn matches_name(&self, query: &str) -> bool {
        self.name.to_lowercase() == query.to_lowercase()
    }

    /// Skill names held by this entity, if any.
    pub fn skill_names(&self) -> Vec<String> {
        match self.text("skills") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Replace the held skill list.
    pub fn set_skill_names(&mut self, names: &[String]) {
        self.set_attr("skills", AttrValue::Text(names.join(", ")));
    }
}

/// Status effect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Buff,
    Debuff,
    Injury,
}

impl StatusKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatusKind::Buff => "buff",
            StatusKind::Debuff => "debuff",
            StatusKind::Injury => "injury",
        }
    }

    /// Parse a status kind from tag text. Unrecognized text reads as a debuff,
    /// the most common category in generated narrative.
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "buff" => StatusKind::Buff,
            "injury" => StatusKind::Injury,
            _ => StatusKind::Debuff,
        }
    }
}

/// A status effect applied to an owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub owner: String,
    pub name: String,
    pub kind: StatusKind,
    /// Free-text duration ("3 ngày", "permanent", ...).
    pub duration: Option<String>,
    /// Turn the status was applied; insertion order for the per-kind cap.
    pub applied_turn: u64,
}

/// A quest objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub description: String,
    pub completed: bool,
}

impl Objective {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    Active,
    Completed,
    Failed,
}

/// A quest with ordered objectives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub title: String,
    pub objectives: Vec<Objective>,
    pub status: QuestStatus,
    pub reward: Option<String>,
}

impl Quest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            objectives: Vec::new(),
            status: QuestStatus::Active,
            reward: None,
        }
    }

    /// All objectives done?
    pub fn is_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }
}

/// In-game time with a simplified calendar (30-day months, 12-month years).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl GameTime {
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }

    /// Advance time by minutes, carrying into hours.
    pub fn advance_minutes(&mut self, minutes: u32) {
        let total = self.minute as u32 + minutes;
        self.minute = (total % 60) as u8;
        self.advance_hours(total / 60);
    }

    /// Advance time by hours, carrying into days.
    pub fn advance_hours(&mut self, hours: u32) {
        let total = self.hour as u32 + hours;
        self.hour = (total % 24) as u8;
        self.advance_days(total / 24);
    }

    /// Advance time by days, carrying into months.
    pub fn advance_days(&mut self, days: u32) {
        let total = self.day as u32 + days;
        self.day = ((total - 1) % 30 + 1) as u8;
        self.advance_months((total - 1) / 30);
    }

    /// Advance time by months, carrying into years.
    pub fn advance_months(&mut self, months: u32) {
        let total = self.month as u32 + months;
        self.month = ((total - 1) % 12 + 1) as u8;
        self.year += ((total - 1) / 12) as i32;
    }

    pub fn advance_years(&mut self, years: u32) {
        self.year += years as i32;
    }

    /// Daypart label for chronicle entries.
    pub fn time_of_day(&self) -> &'static str {
        match self.hour {
            5..=7 => "dawn",
            8..=11 => "morning",
            12..=13 => "midday",
            14..=17 => "afternoon",
            18..=20 => "evening",
            _ => "night",
        }
    }
}

impl Default for GameTime {
    fn default() -> Self {
        Self::new(1, 1, 1, 8, 0)
    }
}

impl std::fmt::Display for GameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Year {} Month {} Day {}, {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// One entry in a chronicle log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronicleEntry {
    pub text: String,
    pub turn: u64,
    pub time: GameTime,
}

/// Three append-only narrative logs at different zoom levels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chronicle {
    /// Per-turn beats.
    pub turns: Vec<ChronicleEntry>,
    /// Chapter-scale summaries.
    pub chapters: Vec<ChronicleEntry>,
    /// Life-defining moments.
    pub memoirs: Vec<ChronicleEntry>,
}

/// Who produced a turn of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRole {
    User,
    Model,
}

/// One raw turn of conversation history. Append-only; the vector index is the
/// implicit ordering and `turn` ties the entry to the turn counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub text: String,
    pub turn: u64,
}

/// A summarized stand-in for a contiguous run of older history entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedSegment {
    pub summary: String,
    pub token_estimate: usize,
    pub first_turn: u64,
    pub last_turn: u64,
}

/// Salience categories for memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryCategory {
    Event,
    Relationship,
    Discovery,
    Combat,
    Achievement,
    General,
}

impl MemoryCategory {
    pub fn name(&self) -> &'static str {
        match self {
            MemoryCategory::Event => "event",
            MemoryCategory::Relationship => "relationship",
            MemoryCategory::Discovery => "discovery",
            MemoryCategory::Combat => "combat",
            MemoryCategory::Achievement => "achievement",
            MemoryCategory::General => "general",
        }
    }
}

/// Where a memory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemorySource {
    /// Synthesized from a CHRONICLE_TURN tag.
    Chronicle,
    /// Produced by the smart memory generator.
    Generated,
}

/// A long-term memory record. Memories are only ever soft-archived; the
/// cleanup coordinator flips `archived` but never deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub text: String,
    /// Salience score, 0-100. Recomputed before every ranking pass.
    pub importance: f32,
    pub category: MemoryCategory,
    pub created_turn: u64,
    pub last_accessed_turn: u64,
    /// Pinned memories are exempt from importance-based archiving (but not
    /// from the hard active-count ceiling).
    pub pinned: bool,
    pub archived: bool,
    pub related_entities: Vec<String>,
    pub tags: Vec<String>,
    pub source: MemorySource,
}

impl Memory {
    pub fn new(text: impl Into<String>, source: MemorySource, turn: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            importance: 50.0,
            category: MemoryCategory::General,
            created_turn: turn,
            last_accessed_turn: turn,
            pinned: false,
            archived: false,
            related_entities: Vec::new(),
            tags: Vec::new(),
            source,
        }
    }

    pub fn with_category(mut self, category: MemoryCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 100.0);
        self
    }

    /// Turns since this memory was last touched.
    pub fn age(&self, current_turn: u64) -> u64 {
        current_turn.saturating_sub(self.last_accessed_turn)
    }
}

/// The complete game state: one immutable snapshot per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Name of the player character; always present in `entities`.
    pub player_name: String,
    /// Known entities, keyed by unique name.
    pub entities: HashMap<String, Entity>,
    /// Names of companions currently travelling with the player.
    pub party: Vec<String>,
    pub statuses: Vec<Status>,
    pub quests: Vec<Quest>,
    pub memories: Vec<Memory>,
    pub history: Vec<HistoryEntry>,
    pub compressed_history: Vec<CompressedSegment>,
    pub chronicle: Chronicle,
    pub time: GameTime,
    pub turn_count: u64,
    pub total_tokens: usize,
    /// Turn the cleanup coordinator last ran; enforces once-per-turn.
    #[serde(default)]
    pub last_cleanup_turn: Option<u64>,
}

impl GameState {
    /// Create a fresh state with a player entity.
    pub fn new(player_name: impl Into<String>) -> Self {
        let player_name = player_name.into();
        let mut entities = HashMap::new();
        entities.insert(
            player_name.clone(),
            Entity::new(EntityKind::Player, player_name.clone()).with_attr("exp", 0.0),
        );
        Self {
            player_name,
            entities,
            party: Vec::new(),
            statuses: Vec::new(),
            quests: Vec::new(),
            memories: Vec::new(),
            history: Vec::new(),
            compressed_history: Vec::new(),
            chronicle: Chronicle::default(),
            time: GameTime::default(),
            turn_count: 0,
            total_tokens: 0,
            last_cleanup_turn: None,
        }
    }

    /// The player entity.
    pub fn player(&self) -> Option<&Entity> {
        self.entities.get(&self.player_name)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let name = self.player_name.clone();
        self.entities.get_mut(&name)
    }

    /// Find an entity by name, exact key first, then case-insensitive scan.
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        if let Some(entity) = self.entities.get(name) {
            return Some(entity);
        }
        self.entities.values().find(|e| e.matches_name(name))
    }

    pub fn find_entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        let key = self.canonical_name(name)?;
        self.entities.get_mut(&key)
    }

    /// Resolve the stored key for a name, case-insensitively.
    pub fn canonical_name(&self, name: &str) -> Option<String> {
        if self.entities.contains_key(name) {
            return Some(name.to_string());
        }
        self.entities
            .values()
            .find(|e| e.matches_name(name))
            .map(|e| e.name.clone())
    }

    /// Insert an entity under its unique name, replacing any same-named record.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.name.clone(), entity);
    }

    /// Remove an entity by name. No-op on a missing target.
    pub fn remove_entity(&mut self, name: &str) -> Option<Entity> {
        let key = self.canonical_name(name)?;
        self.entities.remove(&key)
    }

    /// Atomically rename an entity: remove-then-insert, then repoint party and
    /// status references.
    pub fn rename_entity(&mut self, old: &str, new: &str) {
        let Some(mut entity) = self.remove_entity(old) else {
            return;
        };
        let old_name = entity.name.clone();
        entity.name = new.to_string();
        self.entities.insert(new.to_string(), entity);

        for member in &mut self.party {
            if member.eq_ignore_ascii_case(&old_name) {
                *member = new.to_string();
            }
        }
        for status in &mut self.statuses {
            if status.owner.eq_ignore_ascii_case(&old_name) {
                status.owner = new.to_string();
            }
        }
        if self.player_name.eq_ignore_ascii_case(&old_name) {
            self.player_name = new.to_string();
        }
    }

    /// Apply a status with refresh semantics and a strict FIFO cap of two per
    /// (owner, kind): an existing same-(owner, name) status is removed first,
    /// then if the owner already holds two of the kind only the most recently
    /// applied one survives before the new status is appended.
    pub fn apply_status(&mut self, status: Status) {
        self.statuses.retain(|s| {
            !(s.owner.eq_ignore_ascii_case(&status.owner)
                && s.name.eq_ignore_ascii_case(&status.name))
        });

        let same_kind: Vec<usize> = self
            .statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| s.owner.eq_ignore_ascii_case(&status.owner) && s.kind == status.kind)
            .map(|(i, _)| i)
            .collect();
        if same_kind.len() >= 2 {
            // Keep only the newest same-kind status; drop the rest, oldest first.
            for &i in same_kind[..same_kind.len() - 1].iter().rev() {
                self.statuses.remove(i);
            }
        }

        self.statuses.push(status);
    }

    /// Remove a named status from an owner. No-op on a missing target.
    pub fn remove_status(&mut self, owner: &str, name: &str) {
        self.statuses.retain(|s| {
            !(s.owner.eq_ignore_ascii_case(owner) && s.name.eq_ignore_ascii_case(name))
        });
    }

    /// Statuses currently held by an owner.
    pub fn statuses_of(&self, owner: &str) -> Vec<&Status> {
        self.statuses
            .iter()
            .filter(|s| s.owner.eq_ignore_ascii_case(owner))
            .collect()
    }

    /// Find a quest by title, case-insensitively.
    pub fn find_quest_mut(&mut self, title: &str) -> Option<&mut Quest> {
        self.quests
            .iter_mut()
            .find(|q| q.title.eq_ignore_ascii_case(title))
    }

    /// Append a turn of history.
    pub fn push_history(&mut self, role: HistoryRole, text: impl Into<String>) {
        let turn = self.turn_count;
        self.history.push(HistoryEntry {
            role,
            text: text.into(),
            turn,
        });
    }

    /// Memories still in the active working set.
    pub fn active_memories(&self) -> Vec<&Memory> {
        self.memories.iter().filter(|m| !m.archived).collect()
    }

    /// Serialize the snapshot for an external persistence layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a snapshot previously produced by [`GameState::to_json`].
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(owner: &str, name: &str, kind: StatusKind, turn: u64) -> Status {
        Status {
            owner: owner.to_string(),
            name: name.to_string(),
            kind,
            duration: None,
            applied_turn: turn,
        }
    }

    #[test]
    fn test_new_state_has_player() {
        let state = GameState::new("Lâm Phong");
        assert_eq!(state.player().unwrap().kind, EntityKind::Player);
        assert_eq!(state.player().unwrap().number("exp"), Some(0.0));
    }

    #[test]
    fn test_find_entity_case_insensitive() {
        let mut state = GameState::new("Hero");
        state.insert_entity(Entity::new(EntityKind::Item, "Thiết Kiếm"));
        assert!(state.find_entity("thiết kiếm").is_some());
        assert!(state.find_entity("Thiết Kiếm").is_some());
        assert!(state.find_entity("Ngọc Bội").is_none());
    }

    #[test]
    fn test_rename_is_atomic_and_repoints_references() {
        let mut state = GameState::new("Hero");
        state.insert_entity(Entity::new(EntityKind::Companion, "Tiểu Vũ"));
        state.party.push("Tiểu Vũ".to_string());
        state.apply_status(status("Tiểu Vũ", "Trúng Độc", StatusKind::Debuff, 1));

        state.rename_entity("Tiểu Vũ", "Vũ Nhi");

        assert!(state.find_entity("Tiểu Vũ").is_none());
        assert!(state.find_entity("Vũ Nhi").is_some());
        assert_eq!(state.party, vec!["Vũ Nhi".to_string()]);
        assert_eq!(state.statuses[0].owner, "Vũ Nhi");
    }

    #[test]
    fn test_status_cap_two_per_owner_kind() {
        let mut state = GameState::new("Hero");
        state.apply_status(status("Hero", "A", StatusKind::Debuff, 1));
        state.apply_status(status("Hero", "B", StatusKind::Debuff, 2));
        state.apply_status(status("Hero", "C", StatusKind::Debuff, 3));

        let held = state.statuses_of("Hero");
        assert_eq!(held.len(), 2);
        let names: Vec<&str> = held.iter().map(|s| s.name.as_str()).collect();
        // The first applied status is evicted; the newest two survive.
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn test_status_refresh_does_not_duplicate() {
        let mut state = GameState::new("Hero");
        state.apply_status(status("Hero", "A", StatusKind::Buff, 1));
        state.apply_status(status("Hero", "A", StatusKind::Buff, 5));

        let held = state.statuses_of("Hero");
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].applied_turn, 5);
    }

    #[test]
    fn test_status_cap_and_refresh_ignore_owner_casing() {
        let mut state = GameState::new("Hero");
        state.apply_status(status("Hero", "A", StatusKind::Debuff, 1));
        state.apply_status(status("hero", "a", StatusKind::Debuff, 5));
        let held = state.statuses_of("Hero");
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].applied_turn, 5);

        state.apply_status(status("HERO", "B", StatusKind::Debuff, 6));
        state.apply_status(status("Hero", "C", StatusKind::Debuff, 7));
        let names: Vec<&str> = state
            .statuses_of("Hero")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn test_status_cap_is_per_kind() {
        let mut state = GameState::new("Hero");
        state.apply_status(status("Hero", "A", StatusKind::Buff, 1));
        state.apply_status(status("Hero", "B", StatusKind::Buff, 2));
        state.apply_status(status("Hero", "C", StatusKind::Injury, 3));
        assert_eq!(state.statuses_of("Hero").len(), 3);
    }

    #[test]
    fn test_game_time_carries() {
        let mut time = GameTime::new(1, 12, 30, 23, 50);
        time.advance_minutes(15);
        assert_eq!(time, GameTime::new(2, 1, 1, 0, 5));
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut state = GameState::new("Hero");
        state.insert_entity(
            Entity::new(EntityKind::Item, "Thiết Kiếm")
                .with_attr("quantity", 2.0)
                .with_attr("equippable", true),
        );
        let json = state.to_json().unwrap();
        let restored = GameState::from_json(&json).unwrap();
        let item = restored.find_entity("Thiết Kiếm").unwrap();
        assert_eq!(item.quantity(), 2.0);
        assert_eq!(item.flag("equippable"), Some(true));
    }
}
