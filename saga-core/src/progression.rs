//! Cultivation progression.
//!
//! The realm attribute is always a pure function of accumulated experience and
//! an ordered tier table. Nothing else in the engine may set it directly;
//! handlers that touch `exp` call [`sync_realm`] afterwards.

use crate::world::Entity;
use serde::{Deserialize, Serialize};

/// One rung of the progression ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmTier {
    pub name: String,
    /// Minimum experience required to hold this realm.
    pub min_exp: f64,
}

impl RealmTier {
    pub fn new(name: impl Into<String>, min_exp: f64) -> Self {
        Self {
            name: name.into(),
            min_exp,
        }
    }
}

lazy_static::lazy_static! {
    /// Default cultivation ladder. Tables must be ordered by ascending
    /// `min_exp`; [`realm_for_exp`] relies on it.
    pub static ref REALM_TIERS: Vec<RealmTier> = vec![
        RealmTier::new("Phàm Nhân", 0.0),
        RealmTier::new("Luyện Khí", 100.0),
        RealmTier::new("Trúc Cơ", 500.0),
        RealmTier::new("Kim Đan", 2_000.0),
        RealmTier::new("Nguyên Anh", 8_000.0),
        RealmTier::new("Hóa Thần", 30_000.0),
        RealmTier::new("Luyện Hư", 100_000.0),
        RealmTier::new("Đại Thừa", 500_000.0),
    ];
}

/// Resolve the realm name for an experience total.
///
/// Pure: same `exp` and table always give the same answer. Experience below
/// the first tier clamps to the first tier.
pub fn realm_for_exp(exp: f64, tiers: &[RealmTier]) -> &str {
    let mut current = tiers.first().map(|t| t.name.as_str()).unwrap_or("");
    for tier in tiers {
        if exp >= tier.min_exp {
            current = &tier.name;
        } else {
            break;
        }
    }
    current
}

/// Recompute the derived `realm` attribute from the entity's `exp`.
///
/// Entities without an `exp` attribute are left untouched.
pub fn sync_realm(entity: &mut Entity, tiers: &[RealmTier]) {
    if let Some(exp) = entity.number("exp") {
        let realm = realm_for_exp(exp, tiers).to_string();
        entity.set_attr("realm", realm.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::EntityKind;

    #[test]
    fn test_realm_boundaries() {
        assert_eq!(realm_for_exp(0.0, &REALM_TIERS), "Phàm Nhân");
        assert_eq!(realm_for_exp(99.0, &REALM_TIERS), "Phàm Nhân");
        assert_eq!(realm_for_exp(100.0, &REALM_TIERS), "Luyện Khí");
        assert_eq!(realm_for_exp(499.0, &REALM_TIERS), "Luyện Khí");
        assert_eq!(realm_for_exp(500.0, &REALM_TIERS), "Trúc Cơ");
        assert_eq!(realm_for_exp(1_000_000.0, &REALM_TIERS), "Đại Thừa");
    }

    #[test]
    fn test_negative_exp_clamps_to_first_tier() {
        assert_eq!(realm_for_exp(-50.0, &REALM_TIERS), "Phàm Nhân");
    }

    #[test]
    fn test_sync_realm_overwrites_hand_set_value() {
        let mut hero = Entity::new(EntityKind::Player, "Hero")
            .with_attr("exp", 600.0)
            .with_attr("realm", "Đại Thừa");
        sync_realm(&mut hero, &REALM_TIERS);
        assert_eq!(hero.text("realm"), Some("Trúc Cơ"));
    }

    #[test]
    fn test_sync_realm_noop_without_exp() {
        let mut sword = Entity::new(EntityKind::Item, "Thiết Kiếm");
        sync_realm(&mut sword, &REALM_TIERS);
        assert!(sword.attr("realm").is_none());
    }
}
