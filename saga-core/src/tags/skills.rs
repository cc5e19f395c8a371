//! Skill naming, mastery ranks, and the skill synchronizer.
//!
//! Generated narrative refers to the same technique under shifting names:
//! "Hỏa Cầu Thuật (Sơ Cấp)" and "Hỏa Cầu Thuật (Cao Cấp)" are one skill at two
//! masteries. Two names are the same skill when they agree after stripping
//! parenthetical qualifiers and the mastery vocabulary; a strictly higher rank
//! replaces the lower one everywhere it is held, while an equal rank under a
//! different full name is an additive specialization.

use crate::tags::attrs::TagAttrs;
use crate::world::{EntityKind, GameState};

lazy_static::lazy_static! {
    /// Mastery vocabulary mapped to numeric ranks 1-5. Words outside this
    /// table read as rank 0 (flagged for product clarification rather than
    /// guessed at).
    static ref MASTERY_WORDS: Vec<(&'static str, u8)> = vec![
        ("sơ cấp", 1),
        ("nhập môn", 1),
        ("trung cấp", 2),
        ("tiểu thành", 2),
        ("cao cấp", 3),
        ("đại thành", 4),
        ("viên mãn", 5),
        ("beginner", 1),
        ("intermediate", 2),
        ("advanced", 3),
        ("mastered", 4),
        ("perfected", 5),
    ];
}

/// The mastery rank encoded in a skill name, 0 when none is recognized.
pub fn rank_of(name: &str) -> u8 {
    let lower = name.to_lowercase();
    MASTERY_WORDS
        .iter()
        .filter(|(word, _)| lower.contains(word))
        .map(|(_, rank)| *rank)
        .max()
        .unwrap_or(0)
}

/// The skill name with parenthetical qualifiers and mastery words removed.
pub fn base_name(name: &str) -> String {
    let mut stripped = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }

    let mut lower = stripped.to_lowercase();
    for (word, _) in MASTERY_WORDS.iter() {
        if let Some(pos) = lower.find(word) {
            let end = pos + word.len();
            // Lowercasing keeps byte offsets aligned for this vocabulary;
            // guard the boundaries anyway so odd input degrades to a no-op.
            if stripped.is_char_boundary(pos) && end <= stripped.len() && stripped.is_char_boundary(end) {
                stripped.replace_range(pos..end, "");
                lower.replace_range(pos..end, "");
            }
        }
    }

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ':' || c == ',')
        .trim()
        .to_string()
}

/// Do two names denote the same skill at (possibly) different masteries?
pub fn same_skill(a: &str, b: &str) -> bool {
    let base_a = base_name(a);
    let base_b = base_name(b);
    !base_a.is_empty() && base_a.eq_ignore_ascii_case(&base_b)
}

/// Outcome of merging a learned or upgraded skill into the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillMerge {
    /// No same-base skill existed; a new entry was created.
    Created,
    /// The new name outranks an existing entry, which it replaced everywhere.
    Replaced { previous: String },
    /// An equal-rank name differing from the existing entry; inserted as a
    /// separate specialization.
    Specialized { alongside: String },
    /// The existing entry already holds this rank or better.
    AlreadyKnown { existing: String },
}

/// Known skill entities sharing the new name's base, ordered by ascending
/// rank with a name tiebreak so merges never depend on map iteration order.
pub fn find_same_base_skills(state: &GameState, name: &str) -> Vec<String> {
    let mut matches: Vec<String> = state
        .entities
        .values()
        .filter(|e| e.kind == EntityKind::Skill && same_skill(&e.name, name))
        .map(|e| e.name.clone())
        .collect();
    matches.sort_by(|a, b| rank_of(a).cmp(&rank_of(b)).then_with(|| a.cmp(b)));
    matches
}

/// Reconcile a skill rename across every holder: the flat entity map's skill
/// lists and the party members' lists with it.
pub fn sync_skill_name(state: &mut GameState, old: &str, new: &str) {
    let holders: Vec<String> = state.entities.keys().cloned().collect();
    for holder in holders {
        let Some(entity) = state.entities.get_mut(&holder) else {
            continue;
        };
        let mut names = entity.skill_names();
        if names.is_empty() {
            continue;
        }
        let mut changed = false;
        for slot in &mut names {
            if slot.eq_ignore_ascii_case(old) {
                *slot = new.to_string();
                changed = true;
            }
        }
        if changed {
            names.dedup();
            entity.set_skill_names(&names);
        }
    }
}

/// Merge a newly learned/upgraded skill name into the known-skill set,
/// applying the rank rules. Returns what happened so the handler can update
/// the learner's held list with the surviving name.
pub fn merge_skill(state: &mut GameState, new_name: &str) -> SkillMerge {
    let matches = find_same_base_skills(state, new_name);
    if matches.is_empty() {
        return SkillMerge::Created;
    }
    if let Some(existing) = matches
        .iter()
        .find(|m| m.eq_ignore_ascii_case(new_name))
    {
        return SkillMerge::AlreadyKnown {
            existing: existing.clone(),
        };
    }

    let new_rank = rank_of(new_name);

    // Already held at a strictly higher rank: that entry survives.
    if let Some(best) = matches.iter().rev().find(|m| rank_of(m) > new_rank) {
        return SkillMerge::AlreadyKnown {
            existing: best.clone(),
        };
    }

    // Every strictly lower rank of the base is superseded, wherever held.
    let lower: Vec<String> = matches
        .into_iter()
        .filter(|m| rank_of(m) < new_rank)
        .collect();
    if let Some((first, rest)) = lower.split_first() {
        tracing::info!(
            skill = %first,
            upgraded_to = %new_name,
            superseded = lower.len(),
            new_rank,
            "skill upgraded, replacing lower ranks everywhere"
        );
        state.rename_entity(first, new_name);
        sync_skill_name(state, first, new_name);
        for old in rest {
            state.remove_entity(old);
            sync_skill_name(state, old, new_name);
        }
        return SkillMerge::Replaced {
            previous: first.clone(),
        };
    }

    // Only equal ranks remain: a differing full name is an additive
    // specialization next to the (deterministically) first of them.
    let alongside = find_same_base_skills(state, new_name)
        .into_iter()
        .next()
        .unwrap_or_else(|| new_name.to_string());
    tracing::debug!(
        skill = %new_name,
        alongside = %alongside,
        rank = new_rank,
        "equal-rank variant treated as additive specialization"
    );
    SkillMerge::Specialized { alongside }
}

/// Which step of the fallback chain produced the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnerResolution {
    ExplicitTarget,
    PartyMatch,
    KnownEntity,
    ContentInference,
    DefaultPlayer,
}

impl LearnerResolution {
    pub fn label(&self) -> &'static str {
        match self {
            LearnerResolution::ExplicitTarget => "explicit_target",
            LearnerResolution::PartyMatch => "party_match",
            LearnerResolution::KnownEntity => "known_entity",
            LearnerResolution::ContentInference => "content_inference",
            LearnerResolution::DefaultPlayer => "default_player",
        }
    }
}

/// Resolve who learns a skill when the tag may not say.
///
/// Fallback chain: explicit target attribute → party lookup → known-entity
/// lookup → content-based inference over the narrative → the player. Every
/// step emits an observability event; inference in particular is a
/// lower-confidence guess and is logged as such.
pub fn resolve_learner(
    state: &GameState,
    attrs: &TagAttrs,
    narrative: &str,
) -> (String, LearnerResolution) {
    let hint = attrs
        .text("learner")
        .or_else(|| attrs.text("target"))
        .or_else(|| attrs.text("character"));

    if let Some(hint) = hint {
        if hint.eq_ignore_ascii_case(&state.player_name) {
            tracing::debug!(learner = %hint, step = "explicit_target", "learner resolved");
            return (state.player_name.clone(), LearnerResolution::ExplicitTarget);
        }
        if let Some(member) = state
            .party
            .iter()
            .find(|m| m.eq_ignore_ascii_case(hint))
        {
            tracing::debug!(learner = %member, step = "party_match", "learner resolved");
            return (member.clone(), LearnerResolution::PartyMatch);
        }
        if let Some(name) = state.canonical_name(hint) {
            tracing::debug!(learner = %name, step = "known_entity", "learner resolved");
            return (name, LearnerResolution::KnownEntity);
        }
        tracing::debug!(hint = %hint, "learner hint matched nothing, falling through");
    }

    // No usable hint: infer from the narrative content. Party members first,
    // then any character entity mentioned by name.
    for member in &state.party {
        if narrative.to_lowercase().contains(&member.to_lowercase()) {
            tracing::info!(
                learner = %member,
                step = "content_inference",
                "learner inferred from narrative content (low confidence)"
            );
            return (member.clone(), LearnerResolution::ContentInference);
        }
    }
    for entity in state.entities.values() {
        let is_character = matches!(
            entity.kind,
            EntityKind::Npc | EntityKind::Companion
        );
        if is_character && narrative.to_lowercase().contains(&entity.name.to_lowercase()) {
            tracing::info!(
                learner = %entity.name,
                step = "content_inference",
                "learner inferred from narrative content (low confidence)"
            );
            return (entity.name.clone(), LearnerResolution::ContentInference);
        }
    }

    tracing::debug!(learner = %state.player_name, step = "default_player", "learner defaulted");
    (state.player_name.clone(), LearnerResolution::DefaultPlayer)
}
