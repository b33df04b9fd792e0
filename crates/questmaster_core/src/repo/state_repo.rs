//! State store contract shared by every persistence backend.

use crate::db::DbError;
use crate::model::mutation::Mutation;
use crate::model::state::{CanonicalState, UserId};
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure reported by a `StateStore`.
#[derive(Debug)]
pub enum RepoError {
    /// Record would break a model invariant.
    Validation(ValidationError),
    Db(DbError),
    /// No state exists for this user yet.
    NotFound(UserId),
    /// Mutation references a row the store does not hold.
    MissingRecord { table: &'static str, id: Uuid },
    /// Persisted row cannot be decoded into a model record.
    InvalidData(String),
    /// Backend refused or could not be reached.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(user_id) => write!(f, "no stored state for user `{user_id}`"),
            Self::MissingRecord { table, id } => write!(f, "{table} row not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable home of canonical state, addressed by user.
pub trait StateStore {
    /// Loads everything stored for `user_id`.
    ///
    /// Returns `RepoError::NotFound` when the user has no stored state.
    fn load(&self, user_id: &str) -> RepoResult<CanonicalState>;

    /// Durably applies one engine transition as a single unit.
    fn commit(&self, user_id: &str, mutation: &Mutation) -> RepoResult<()>;
}

impl<S: StateStore + ?Sized> StateStore for &S {
    fn load(&self, user_id: &str) -> RepoResult<CanonicalState> {
        (**self).load(user_id)
    }

    fn commit(&self, user_id: &str, mutation: &Mutation) -> RepoResult<()> {
        (**self).commit(user_id, mutation)
    }
}
