//! Narrative engine core for an AI-driven cultivation RPG.
//!
//! This crate provides:
//! - A tag interpreter that turns bracket directives embedded in generated
//!   narrative into deterministic game-state mutations
//! - A world model of entities, statuses, quests, chronicle logs, and time
//! - Cultivation-realm progression derived purely from experience
//! - A bounded memory subsystem: importance scoring, enhancement, smart
//!   generation, history compression, and a unified cleanup coordinator
//!
//! # Quick Start
//!
//! ```
//! use saga_core::tags::interpret;
//! use saga_core::world::GameState;
//!
//! let state = GameState::new("Lý Thanh Vân");
//! let narrative = r#"Ngươi nhặt được một thanh kiếm.
//! [ITEM_ACQUIRED: name="Thiết Kiếm" equippable=true]"#;
//!
//! let outcome = interpret(narrative, &state, true);
//! assert!(outcome.state.find_entity("Thiết Kiếm").is_some());
//! assert!(!outcome.display.contains("ITEM_ACQUIRED"));
//! ```

pub mod memory;
pub mod progression;
pub mod tags;
pub mod world;

// Re-export for convenience
pub use memory::{run_cleanup, CleanupConfig, CleanupReport};
pub use tags::{interpret, Interpretation, TagKind};
pub use world::{Entity, EntityKind, GameState, Memory, Quest, Status};
