//! EXP-to-level conversion.
//!
//! # Invariants
//! - Output profiles always satisfy `0 <= exp < level * 100`.
//! - A single reward may cross several level thresholds.

use crate::model::profile::PlayerProfile;

/// Level change caused by one EXP award.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelOutcome {
    /// True iff at least one level was gained.
    pub leveled_up: bool,
    /// Final level when `leveled_up` is true.
    pub new_level: Option<u32>,
}

/// Adds `amount` EXP to `profile`, carrying overflow into new levels.
///
/// Each level costs `level * 100` at the moment it is crossed, so the
/// threshold is recomputed after every increment.
pub fn apply_exp(profile: PlayerProfile, amount: u32) -> (PlayerProfile, LevelOutcome) {
    let mut level = profile.level.max(1);
    let mut exp = profile.exp.saturating_add(amount);
    let mut leveled_up = false;

    loop {
        let threshold = PlayerProfile { level, exp }.required_exp();
        if exp < threshold {
            break;
        }
        exp -= threshold;
        level += 1;
        leveled_up = true;
    }

    let outcome = LevelOutcome {
        leveled_up,
        new_level: leveled_up.then_some(level),
    };
    (PlayerProfile { level, exp }, outcome)
}

#[cfg(test)]
mod tests {
    use super::apply_exp;
    use crate::model::profile::PlayerProfile;

    #[test]
    fn exact_threshold_levels_up_with_zero_remainder() {
        let (profile, outcome) = apply_exp(PlayerProfile { level: 1, exp: 90 }, 10);
        assert_eq!(profile, PlayerProfile { level: 2, exp: 0 });
        assert_eq!(outcome.new_level, Some(2));
    }

    #[test]
    fn reward_below_threshold_keeps_level() {
        let (profile, outcome) = apply_exp(PlayerProfile { level: 3, exp: 10 }, 25);
        assert_eq!(profile, PlayerProfile { level: 3, exp: 35 });
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.new_level, None);
    }
}
