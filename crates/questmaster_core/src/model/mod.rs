//! Domain model for the quest state engine.
//!
//! # Responsibility
//! - Define canonical records for profile, habits, tasks and activity logs.
//! - Define the `Mutation` unit that every state transition is committed as.
//!
//! # Invariants
//! - `PlayerProfile::exp` is always below the current level threshold.
//! - Habit completion dates are a set; a date appears at most once.
//! - A project's `current_step` always indexes an existing step.
//! - Log entries are immutable and kept newest-first.

pub mod habit;
pub mod log_entry;
pub mod mutation;
pub mod profile;
pub mod state;
pub mod task;
pub mod validation;
