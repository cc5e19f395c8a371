//! Attribute parsing for tag bodies.
//!
//! A tag body is a run of `key=value` pairs. Values may be double-quoted to
//! keep internal whitespace; a fixed set of boolean-named keys coerce
//! true/false, a fixed set of numeric-named keys coerce to numbers when the
//! raw text parses, and `objectives` splits on `;` into an ordered list.

use crate::world::{AttrValue, Objective};
use std::collections::HashSet;

lazy_static::lazy_static! {
    /// Keys whose values coerce "true"/"false" (case-insensitive) to flags.
    static ref BOOL_KEYS: HashSet<&'static str> = [
        "equippable",
        "equipped",
        "stackable",
        "consumable",
        "pinned",
        "completed",
        "permanent",
    ]
    .into_iter()
    .collect();

    /// Keys whose values coerce to numbers when the raw text parses
    /// numerically; otherwise the raw text is kept.
    static ref NUMERIC_KEYS: HashSet<&'static str> = [
        "quantity",
        "amount",
        "exp",
        "durability",
        "level",
        "value",
        "change",
        "years",
        "months",
        "days",
        "hours",
        "minutes",
    ]
    .into_iter()
    .collect();
}

/// Parsed attributes of one tag, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagAttrs {
    pairs: Vec<(String, AttrValue)>,
}

impl TagAttrs {
    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_number)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(AttrValue::as_flag)
    }

    pub fn objectives(&self, key: &str) -> Option<&[Objective]> {
        self.get(key).and_then(AttrValue::as_objectives)
    }

    /// Any value rendered as display text.
    pub fn display(&self, key: &str) -> Option<String> {
        self.get(key).map(AttrValue::display)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Iterate pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Tokenize one tag body into typed key/value pairs.
///
/// Malformed fragments are skipped, never fatal; a body that yields zero
/// attributes is the caller's cue to record the tag as unprocessed.
pub fn parse_attrs(inner: &str) -> TagAttrs {
    let mut pairs = Vec::new();
    let mut chars = inner.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        // Key runs up to '='.
        let mut key_end = start;
        let mut found_eq = false;
        for (i, c) in chars.by_ref() {
            if c == '=' {
                key_end = i;
                found_eq = true;
                break;
            }
            if c.is_whitespace() {
                key_end = i;
                break;
            }
            key_end = i + c.len_utf8();
        }
        let key = inner[start..key_end].trim();
        if !found_eq || key.is_empty() {
            // Bare word without a value; skip it.
            continue;
        }

        // Value: quoted keeps whitespace, unquoted ends at whitespace.
        let value = match chars.peek() {
            Some(&(vstart, '"')) => {
                chars.next();
                let content_start = vstart + 1;
                let mut content_end = inner.len();
                for (i, c) in chars.by_ref() {
                    if c == '"' {
                        content_end = i;
                        break;
                    }
                }
                inner[content_start..content_end.min(inner.len())].to_string()
            }
            Some(&(vstart, _)) => {
                let mut vend = inner.len();
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() {
                        vend = i;
                        break;
                    }
                    chars.next();
                    vend = i + c.len_utf8();
                }
                inner[vstart..vend].to_string()
            }
            None => String::new(),
        };

        pairs.push((key.to_string(), coerce(key, &value)));
    }

    TagAttrs { pairs }
}

/// Apply the per-key coercion rules.
fn coerce(key: &str, raw: &str) -> AttrValue {
    let key_lower = key.to_lowercase();

    if key_lower == "objectives" {
        let objectives: Vec<Objective> = raw
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Objective::new)
            .collect();
        return AttrValue::Objectives(objectives);
    }

    if BOOL_KEYS.contains(key_lower.as_str()) {
        match raw.to_lowercase().as_str() {
            "true" => return AttrValue::Flag(true),
            "false" => return AttrValue::Flag(false),
            _ => {}
        }
    }

    if NUMERIC_KEYS.contains(key_lower.as_str()) {
        if let Ok(n) = raw.trim().parse::<f64>() {
            return AttrValue::Number(n);
        }
    }

    AttrValue::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_values_keep_whitespace() {
        let attrs = parse_attrs(r#"name="Thiết Kiếm" description="Một thanh kiếm sắt""#);
        assert_eq!(attrs.text("name"), Some("Thiết Kiếm"));
        assert_eq!(attrs.text("description"), Some("Một thanh kiếm sắt"));
    }

    #[test]
    fn test_unquoted_values_end_at_whitespace() {
        let attrs = parse_attrs("target=Hero amount=25");
        assert_eq!(attrs.text("target"), Some("Hero"));
        assert_eq!(attrs.number("amount"), Some(25.0));
    }

    #[test]
    fn test_boolean_coercion_case_insensitive() {
        let attrs = parse_attrs("equippable=TRUE equipped=False");
        assert_eq!(attrs.flag("equippable"), Some(true));
        assert_eq!(attrs.flag("equipped"), Some(false));
    }

    #[test]
    fn test_non_boolean_text_for_bool_key_stays_text() {
        let attrs = parse_attrs("equippable=maybe");
        assert_eq!(attrs.text("equippable"), Some("maybe"));
    }

    #[test]
    fn test_numeric_key_falls_back_to_text() {
        let attrs = parse_attrs(r#"quantity=3 durability="như mới""#);
        assert_eq!(attrs.number("quantity"), Some(3.0));
        assert_eq!(attrs.text("durability"), Some("như mới"));
    }

    #[test]
    fn test_objectives_split_in_order() {
        let attrs = parse_attrs(r#"objectives="Tìm kiếm manh mối; Báo cáo trưởng lão""#);
        let objectives = attrs.objectives("objectives").unwrap();
        assert_eq!(objectives.len(), 2);
        assert_eq!(objectives[0].description, "Tìm kiếm manh mối");
        assert!(!objectives[0].completed);
        assert_eq!(objectives[1].description, "Báo cáo trưởng lão");
    }

    #[test]
    fn test_zero_attributes_is_empty_not_error() {
        assert!(parse_attrs("just some prose").is_empty());
        assert!(parse_attrs("").is_empty());
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let attrs = parse_attrs(r#"name="Thiết Kiếm"#);
        assert_eq!(attrs.text("name"), Some("Thiết Kiếm"));
    }

    #[test]
    fn test_source_order_preserved() {
        let attrs = parse_attrs("b=1 a=2");
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
