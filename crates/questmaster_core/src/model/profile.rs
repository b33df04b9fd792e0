//! Player profile: current level and EXP carried toward the next level.

use crate::constants::EXP_PER_LEVEL;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// EXP required to advance out of `level`.
///
/// Strictly increasing per level: `L * 100`.
pub fn required_exp_for_level(level: u32) -> u32 {
    level.saturating_mul(EXP_PER_LEVEL)
}

/// Level/EXP pair for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub level: u32,
    pub exp: u32,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self { level: 1, exp: 0 }
    }
}

impl PlayerProfile {
    /// EXP needed to leave the current level.
    pub fn required_exp(&self) -> u32 {
        required_exp_for_level(self.level)
    }

    /// Checks `level >= 1` and `0 <= exp < level * 100`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.level < 1 {
            return Err(ValidationError::LevelBelowOne(self.level));
        }
        if self.exp >= self.required_exp() {
            return Err(ValidationError::ExpOutOfRange {
                level: self.level,
                exp: self.exp,
            });
        }
        Ok(())
    }
}
