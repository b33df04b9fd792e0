//! SQLite home of the quest store.
//!
//! # Responsibility
//! - Hand out connections whose schema holds one `profiles` row per user,
//!   that user's `habits` (with `habit_completions` dates), `tasks` (with
//!   ordered `task_steps`) and the append-only `logs` table.
//! - Keep that schema current through numbered migrations.
//!
//! # Invariants
//! - Every per-user row hangs off `profiles(user_id)` and is removed with it
//!   (`ON DELETE CASCADE`), which is how `Mutation::Initialize` resets a user.
//! - The applied schema version lives in `PRAGMA user_version`; a database
//!   written by a newer binary is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or migrating the quest database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Database was migrated by a newer build of the quest store.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "quest database schema v{db_version} is newer than this build (v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
