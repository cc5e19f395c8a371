//! The narrative tag interpreter.
//!
//! Generated narrative carries bracket-delimited directives like
//! `[LORE_ITEM: name="Thiết Kiếm" equippable=true]`. The interpreter scans the
//! text, strips every tag from the display copy, and — when side effects are
//! enabled — dispatches each recognized directive to its handler against a
//! cloned snapshot. Dry runs re-hydrate saved transcripts without re-applying
//! effects: same display text, zero mutation.

pub mod attrs;
pub mod handlers;
pub mod kind;
pub mod skills;

pub use attrs::{parse_attrs, TagAttrs};
pub use kind::TagKind;

use crate::world::GameState;

/// Delimiters of the model's private reasoning block.
const REASONING_OPEN: &str = "<thinking>";
const REASONING_CLOSE: &str = "</thinking>";

/// Why a tag produced no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticReason {
    /// The tag body yielded zero attributes.
    Unprocessed,
    /// The keyword names no known directive.
    UnknownKind { keyword: String },
}

/// A soft failure recorded while interpreting. Diagnostics never abort the
/// turn; they exist for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The raw tag text as it appeared in the narrative.
    pub raw: String,
    pub reason: DiagnosticReason,
}

/// Result of interpreting one turn of narrative.
#[derive(Debug, Clone)]
pub struct Interpretation {
    /// Display-ready text: tags and reasoning block removed.
    pub display: String,
    /// The post-interpretation snapshot. Identical to the input snapshot when
    /// side effects were disabled or the narrative carried no directives.
    pub state: GameState,
    pub diagnostics: Vec<Diagnostic>,
    /// Extracted reasoning block, if the narrative carried one.
    pub reasoning: Option<String>,
    /// Human-readable audit of applied effects, in tag order.
    pub events: Vec<String>,
}

/// One tag found by the scanner.
#[derive(Debug)]
struct RawTag {
    /// Byte range of the whole `[...]` span in the source text.
    start: usize,
    end: usize,
    keyword: String,
    body: String,
}

/// Interpret one turn of narrative against a snapshot.
///
/// Always strips recognized tag syntax from the returned display text; mutates
/// a clone of `state` only when `apply_side_effects` is true.
pub fn interpret(text: &str, state: &GameState, apply_side_effects: bool) -> Interpretation {
    let mut next = state.clone();
    let mut diagnostics = Vec::new();
    let mut events = Vec::new();

    let (without_reasoning, reasoning) = extract_reasoning(text);
    if let Some(ref block) = reasoning {
        tracing::debug!(chars = block.len(), "reasoning block extracted from narrative");
    }

    let tags = scan_tags(&without_reasoning);

    // Narrative with tags removed, in one pass over the byte ranges.
    let mut display = String::with_capacity(without_reasoning.len());
    let mut cursor = 0;
    for tag in &tags {
        display.push_str(&without_reasoning[cursor..tag.start]);
        cursor = tag.end;
    }
    display.push_str(&without_reasoning[cursor..]);
    let display = tidy(&display);

    for tag in &tags {
        let raw = without_reasoning[tag.start..tag.end].to_string();
        let Some(kind) = TagKind::from_keyword(&tag.keyword) else {
            tracing::warn!(keyword = %tag.keyword, "unknown tag kind");
            diagnostics.push(Diagnostic {
                raw,
                reason: DiagnosticReason::UnknownKind {
                    keyword: tag.keyword.clone(),
                },
            });
            continue;
        };

        let attrs = parse_attrs(&tag.body);
        if attrs.is_empty() && kind != TagKind::Narration {
            tracing::debug!(keyword = %tag.keyword, "tag with zero attributes left unprocessed");
            diagnostics.push(Diagnostic {
                raw,
                reason: DiagnosticReason::Unprocessed,
            });
            continue;
        }

        if apply_side_effects {
            handlers::apply_tag(&mut next, kind, &attrs, &without_reasoning, &mut events);
        }
    }

    Interpretation {
        display,
        state: next,
        diagnostics,
        reasoning,
        events,
    }
}

/// Remove every `<thinking>...</thinking>` block, returning the remaining
/// text and the concatenated block contents. An unterminated opener is left
/// in place rather than guessed at.
fn extract_reasoning(text: &str) -> (String, Option<String>) {
    let mut remaining = String::with_capacity(text.len());
    let mut reasoning = String::new();
    let mut rest = text;

    loop {
        match rest.find(REASONING_OPEN) {
            Some(open) => {
                let after_open = open + REASONING_OPEN.len();
                match rest[after_open..].find(REASONING_CLOSE) {
                    Some(close) => {
                        remaining.push_str(&rest[..open]);
                        let block = rest[after_open..after_open + close].trim();
                        if !reasoning.is_empty() {
                            reasoning.push('\n');
                        }
                        reasoning.push_str(block);
                        rest = &rest[after_open + close + REASONING_CLOSE.len()..];
                    }
                    None => {
                        remaining.push_str(rest);
                        break;
                    }
                }
            }
            None => {
                remaining.push_str(rest);
                break;
            }
        }
    }

    let reasoning = if reasoning.is_empty() {
        None
    } else {
        Some(reasoning)
    };
    (remaining, reasoning)
}

/// Find every bracket tag of the form `[KEYWORD: body]`. Double quotes in the
/// body shield a `]` from closing the tag. Brackets that do not match the tag
/// shape are ordinary prose and stay put.
fn scan_tags(text: &str) -> Vec<RawTag> {
    let bytes = text.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }

        // Keyword: ASCII letters, digits, underscores.
        let key_start = i + 1;
        let mut j = key_start;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        if j == key_start || j >= bytes.len() || bytes[j] != b':' {
            i += 1;
            continue;
        }
        let keyword = text[key_start..j].to_string();

        // Body runs to the closing bracket, quotes respected.
        let body_start = j + 1;
        let mut k = body_start;
        let mut in_quotes = false;
        let mut close = None;
        while k < bytes.len() {
            match bytes[k] {
                b'"' => in_quotes = !in_quotes,
                b']' if !in_quotes => {
                    close = Some(k);
                    break;
                }
                _ => {}
            }
            k += 1;
        }
        let Some(close) = close else {
            // Unterminated bracket; treat as prose.
            i += 1;
            continue;
        };

        tags.push(RawTag {
            start: i,
            end: close + 1,
            keyword,
            body: text[body_start..close].to_string(),
        });
        i = close + 1;
    }

    tags
}

/// Clean up the whitespace holes stripping leaves behind.
fn tidy(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::EntityKind;

    const NARRATIVE: &str = "Ngươi nhặt được một thanh kiếm.\n\
        [LORE_ITEM: name=\"Thiết Kiếm\" description=\"Một thanh kiếm sắt\" equippable=true]\n\
        Lưỡi kiếm lóe sáng dưới ánh trăng.";

    #[test]
    fn test_tags_stripped_and_applied() {
        let state = GameState::new("Hero");
        let result = interpret(NARRATIVE, &state, true);

        assert!(!result.display.contains('['));
        assert!(result.display.contains("Ngươi nhặt được"));
        assert!(result.display.contains("ánh trăng"));

        let item = result.state.find_entity("Thiết Kiếm").unwrap();
        assert_eq!(item.kind, EntityKind::Item);
        assert_eq!(item.flag("equippable"), Some(true));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_dry_run_same_display_zero_mutation() {
        let state = GameState::new("Hero");
        let wet = interpret(NARRATIVE, &state, true);
        let dry_a = interpret(NARRATIVE, &state, false);
        let dry_b = interpret(NARRATIVE, &state, false);

        assert_eq!(dry_a.display, dry_b.display);
        assert_eq!(dry_a.display, wet.display);
        assert!(dry_a.state.find_entity("Thiết Kiếm").is_none());
        assert_eq!(dry_a.state.entities.len(), state.entities.len());
    }

    #[test]
    fn test_tag_free_narrative_is_pure_passthrough() {
        let state = GameState::new("Hero");
        let text = "Gió thổi qua rừng trúc.";
        let result = interpret(text, &state, true);
        assert_eq!(result.display, text);
        assert_eq!(result.state.to_json().unwrap(), state.to_json().unwrap());
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_unknown_tag_collected_not_raised() {
        let state = GameState::new("Hero");
        let result = interpret("Trước mắt [SUMMON_DRAGON: name=Long] hiện ra.", &state, true);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(
            result.diagnostics[0].reason,
            DiagnosticReason::UnknownKind { .. }
        ));
        assert!(!result.display.contains("SUMMON_DRAGON"));
    }

    #[test]
    fn test_zero_attribute_tag_is_unprocessed() {
        let state = GameState::new("Hero");
        let result = interpret("[LORE_ITEM: vô nghĩa]", &state, true);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].reason, DiagnosticReason::Unprocessed);
        assert!(result.state.entities.len() == 1);
    }

    #[test]
    fn test_narration_sentinel_ignored_silently() {
        let state = GameState::new("Hero");
        let result = interpret("[NARRATION: text=\"bla\"] Câu chuyện tiếp diễn.", &state, true);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.display, "Câu chuyện tiếp diễn.");
    }

    #[test]
    fn test_reasoning_block_extracted() {
        let state = GameState::new("Hero");
        let text = "<thinking>người chơi muốn chiến đấu</thinking>Trận chiến bắt đầu.";
        let result = interpret(text, &state, true);
        assert_eq!(result.display, "Trận chiến bắt đầu.");
        assert_eq!(
            result.reasoning.as_deref(),
            Some("người chơi muốn chiến đấu")
        );
    }

    #[test]
    fn test_unterminated_reasoning_left_in_place() {
        let state = GameState::new("Hero");
        let text = "<thinking>dang dở... và phần còn lại.";
        let result = interpret(text, &state, true);
        assert!(result.reasoning.is_none());
        assert!(result.display.contains("<thinking>"));
    }

    #[test]
    fn test_bracket_prose_survives() {
        let state = GameState::new("Hero");
        let text = "Tấm bia đá khắc [cổ văn khó hiểu].";
        let result = interpret(text, &state, true);
        assert_eq!(result.display, text);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_quoted_bracket_does_not_close_tag() {
        let state = GameState::new("Hero");
        let text = r#"[LORE_NPC: name="Lão [Kiếm] Tổ" description=x] xuất hiện."#;
        let result = interpret(text, &state, true);
        assert!(result.state.find_entity("Lão [Kiếm] Tổ").is_some());
        assert_eq!(result.display, "xuất hiện.");
    }

    #[test]
    fn test_three_statuses_same_kind_keep_newest_two() {
        let state = GameState::new("Hero");
        let text = "\
            [STATUS_APPLIED_SELF: name=\"Trúng Độc\" type=debuff]\
            [STATUS_APPLIED_SELF: name=\"Suy Nhược\" type=debuff]\
            [STATUS_APPLIED_SELF: name=\"Tê Liệt\" type=debuff]";
        let result = interpret(text, &state, true);
        let held = result.state.statuses_of("Hero");
        assert_eq!(held.len(), 2);
        let names: Vec<&str> = held.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Suy Nhược", "Tê Liệt"]);
    }
}
