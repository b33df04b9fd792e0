//! Derived read-only views over canonical state.
//!
//! # Responsibility
//! - Project "today", active-quest and history aggregates for presentation.
//! - Stay pure: views never mutate state and are never persisted.
//!
//! # Invariants
//! - Every view is recomputed from canonical state on each publish.
//! - Recurrence filtering happens here, not in the completion service.

pub mod history;
pub mod snapshot;
pub mod today;
