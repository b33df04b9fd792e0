//! Validation errors for domain records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a domain record breaks one of its documented invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Record identifiers must not be the nil UUID.
    NilId,
    /// Titles must contain at least one non-whitespace character.
    BlankTitle,
    /// Profile level starts at 1.
    LevelBelowOne(u32),
    /// Profile EXP must stay below `level * 100`.
    ExpOutOfRange { level: u32, exp: u32 },
    /// Weekday indices are `0..=6` with 0 = Sunday.
    WeekdayOutOfRange(u8),
    /// Projects need at least one step.
    EmptySteps,
    /// Project cursor points past the last step.
    StepOutOfRange {
        current_step: usize,
        step_count: usize,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "record id must not be nil"),
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::LevelBelowOne(level) => write!(f, "level ({level}) must be >= 1"),
            Self::ExpOutOfRange { level, exp } => write!(
                f,
                "exp ({exp}) must be < {} at level {level}",
                crate::model::profile::required_exp_for_level(*level)
            ),
            Self::WeekdayOutOfRange(day) => {
                write!(f, "weekday index ({day}) must be within 0..=6")
            }
            Self::EmptySteps => write!(f, "project must have at least one step"),
            Self::StepOutOfRange {
                current_step,
                step_count,
            } => write!(
                f,
                "current_step ({current_step}) must be < step count ({step_count})"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims a user-entered title and rejects blank values.
pub(crate) fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}
