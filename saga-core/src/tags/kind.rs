//! The closed set of tag directives recognized in generated narrative.

use serde::{Deserialize, Serialize};

/// Every directive kind the interpreter understands.
///
/// The enum is closed so dispatch stays exhaustive: adding a kind without a
/// handler fails to compile. Unknown keywords never reach this type; the
/// scanner reports them as diagnostics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    // Time
    TimeElapsed,

    // Chronicle logs
    ChronicleTurn,
    ChronicleChapter,
    ChronicleMemoir,

    // Status effects
    StatusAppliedSelf,
    StatusApplied,
    StatusCuredSelf,
    StatusCured,

    // Lore creation (merge-if-exists, create-if-absent)
    LoreCharacter,
    LoreNpc,
    LoreItem,
    LoreSkill,
    LoreLocation,
    LoreFaction,
    LoreConcept,

    // Skill mechanics
    SkillExpGain,
    Breakthrough,
    SkillLearned,
    SkillUpgraded,

    // Generic entity updates
    EntityUpdate,
    StatChanged,

    // Inventory transitions
    ItemAcquired,
    ItemConsumed,
    ItemEquipped,
    ItemUnequipped,
    ItemTransformed,
    ItemDamaged,
    ItemRepaired,
    ItemDiscarded,

    // Companions and relationships
    CompanionJoined,
    CompanionLeft,
    RelationshipChanged,

    // Quest lifecycle
    QuestAssigned,
    QuestUpdated,
    QuestObjectiveCompleted,
    QuestCompleted,
    QuestFailed,

    // Memory management
    MemoryPinned,

    /// Sentinel the model sometimes wraps plain prose in; stripped and
    /// deliberately ignored without a diagnostic.
    Narration,
}

impl TagKind {
    /// Parse a tag keyword. Returns `None` for unrecognized kinds so the
    /// interpreter can collect them as diagnostics.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword.trim().to_uppercase().as_str() {
            "TIME_ELAPSED" => TagKind::TimeElapsed,
            "CHRONICLE_TURN" => TagKind::ChronicleTurn,
            "CHRONICLE_CHAPTER" => TagKind::ChronicleChapter,
            "CHRONICLE_MEMOIR" => TagKind::ChronicleMemoir,
            "STATUS_APPLIED_SELF" => TagKind::StatusAppliedSelf,
            "STATUS_APPLIED" => TagKind::StatusApplied,
            "STATUS_CURED_SELF" => TagKind::StatusCuredSelf,
            "STATUS_CURED" => TagKind::StatusCured,
            "LORE_CHARACTER" => TagKind::LoreCharacter,
            "LORE_NPC" => TagKind::LoreNpc,
            "LORE_ITEM" => TagKind::LoreItem,
            "LORE_SKILL" => TagKind::LoreSkill,
            "LORE_LOCATION" => TagKind::LoreLocation,
            "LORE_FACTION" => TagKind::LoreFaction,
            "LORE_CONCEPT" => TagKind::LoreConcept,
            "SKILL_EXP_GAIN" => TagKind::SkillExpGain,
            "BREAKTHROUGH" => TagKind::Breakthrough,
            "SKILL_LEARNED" => TagKind::SkillLearned,
            "SKILL_UPGRADED" => TagKind::SkillUpgraded,
            "ENTITY_UPDATE" => TagKind::EntityUpdate,
            "STAT_CHANGED" => TagKind::StatChanged,
            "ITEM_ACQUIRED" => TagKind::ItemAcquired,
            "ITEM_CONSUMED" => TagKind::ItemConsumed,
            "ITEM_EQUIPPED" => TagKind::ItemEquipped,
            "ITEM_UNEQUIPPED" => TagKind::ItemUnequipped,
            "ITEM_TRANSFORMED" => TagKind::ItemTransformed,
            "ITEM_DAMAGED" => TagKind::ItemDamaged,
            "ITEM_REPAIRED" => TagKind::ItemRepaired,
            "ITEM_DISCARDED" => TagKind::ItemDiscarded,
            "COMPANION_JOINED" => TagKind::CompanionJoined,
            "COMPANION_LEFT" => TagKind::CompanionLeft,
            "RELATIONSHIP_CHANGED" => TagKind::RelationshipChanged,
            "QUEST_ASSIGNED" => TagKind::QuestAssigned,
            "QUEST_UPDATED" => TagKind::QuestUpdated,
            "QUEST_OBJECTIVE_COMPLETED" => TagKind::QuestObjectiveCompleted,
            "QUEST_COMPLETED" => TagKind::QuestCompleted,
            "QUEST_FAILED" => TagKind::QuestFailed,
            "MEMORY_PINNED" => TagKind::MemoryPinned,
            "NARRATION" => TagKind::Narration,
            _ => return None,
        };
        Some(kind)
    }

    /// The wire keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            TagKind::TimeElapsed => "TIME_ELAPSED",
            TagKind::ChronicleTurn => "CHRONICLE_TURN",
            TagKind::ChronicleChapter => "CHRONICLE_CHAPTER",
            TagKind::ChronicleMemoir => "CHRONICLE_MEMOIR",
            TagKind::StatusAppliedSelf => "STATUS_APPLIED_SELF",
            TagKind::StatusApplied => "STATUS_APPLIED",
            TagKind::StatusCuredSelf => "STATUS_CURED_SELF",
            TagKind::StatusCured => "STATUS_CURED",
            TagKind::LoreCharacter => "LORE_CHARACTER",
            TagKind::LoreNpc => "LORE_NPC",
            TagKind::LoreItem => "LORE_ITEM",
            TagKind::LoreSkill => "LORE_SKILL",
            TagKind::LoreLocation => "LORE_LOCATION",
            TagKind::LoreFaction => "LORE_FACTION",
            TagKind::LoreConcept => "LORE_CONCEPT",
            TagKind::SkillExpGain => "SKILL_EXP_GAIN",
            TagKind::Breakthrough => "BREAKTHROUGH",
            TagKind::SkillLearned => "SKILL_LEARNED",
            TagKind::SkillUpgraded => "SKILL_UPGRADED",
            TagKind::EntityUpdate => "ENTITY_UPDATE",
            TagKind::StatChanged => "STAT_CHANGED",
            TagKind::ItemAcquired => "ITEM_ACQUIRED",
            TagKind::ItemConsumed => "ITEM_CONSUMED",
            TagKind::ItemEquipped => "ITEM_EQUIPPED",
            TagKind::ItemUnequipped => "ITEM_UNEQUIPPED",
            TagKind::ItemTransformed => "ITEM_TRANSFORMED",
            TagKind::ItemDamaged => "ITEM_DAMAGED",
            TagKind::ItemRepaired => "ITEM_REPAIRED",
            TagKind::ItemDiscarded => "ITEM_DISCARDED",
            TagKind::CompanionJoined => "COMPANION_JOINED",
            TagKind::CompanionLeft => "COMPANION_LEFT",
            TagKind::RelationshipChanged => "RELATIONSHIP_CHANGED",
            TagKind::QuestAssigned => "QUEST_ASSIGNED",
            TagKind::QuestUpdated => "QUEST_UPDATED",
            TagKind::QuestObjectiveCompleted => "QUEST_OBJECTIVE_COMPLETED",
            TagKind::QuestCompleted => "QUEST_COMPLETED",
            TagKind::QuestFailed => "QUEST_FAILED",
            TagKind::MemoryPinned => "MEMORY_PINNED",
            TagKind::Narration => "NARRATION",
        }
    }
}
