//! Engine use-case services.
//!
//! # Responsibility
//! - `leveling`: pure EXP-to-level conversion.
//! - `completion`: pure habit/task state transitions.
//! - `quest_engine`: stateful orchestration over a `StateStore`.
//!
//! # Invariants
//! - Only `quest_engine` talks to persistence; the other modules are pure.

pub mod completion;
pub mod leveling;
pub mod quest_engine;
