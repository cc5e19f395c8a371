//! Long-term memory management.
//!
//! Narrative turns produce more text than any context window can hold, so
//! this subsystem keeps the working set bounded: memories are scored for
//! salience, enriched with metadata, generated from history when chronicle
//! tags miss a beat, and old raw history is folded into compressed summaries.
//! The [`cleanup`] coordinator ties it together under a single token budget.

pub mod cleanup;
pub mod compressor;
pub mod enhancer;
pub mod generator;
pub mod scorer;
pub mod tokens;

pub use cleanup::{run_cleanup, CleanupConfig, CleanupError, CleanupReport};
pub use generator::{CategoryToggles, SmartMemoryConfig};
