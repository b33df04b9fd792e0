//! State store adapter contracts and implementations.
//!
//! # Responsibility
//! - Define the `StateStore` contract the engine persists through.
//! - Keep SQL details out of the engine and completion service.
//!
//! # Invariants
//! - One `commit` call persists one whole mutation or nothing.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `load` reports `RepoError::NotFound` for unknown users so the engine can
//!   initialize defaults.

pub mod memory_repo;
pub mod sqlite_repo;
pub mod state_repo;
