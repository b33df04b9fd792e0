//! Habit domain model.
//!
//! # Responsibility
//! - Describe a recurring action validated once per calendar day.
//! - Map calendar dates to weekday indices used by recurrence sets.
//!
//! # Invariants
//! - `recurrence_days` only holds indices `0..=6` (0 = Sunday).
//! - `completed_dates` only grows and holds each date at most once.

use crate::model::validation::{normalize_title, ValidationError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for a habit.
pub type HabitId = Uuid;

/// Every weekday index, Sunday first.
pub const ALL_WEEKDAYS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];

/// Weekday index of `date` with 0 = Sunday and 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always within 0..=6.
    date.weekday().num_days_from_sunday() as u8
}

/// Recurring habit checked off at most once per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub title: String,
    pub recurrence_days: BTreeSet<u8>,
    /// Serialized as `YYYY-MM-DD` strings.
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Habit {
    /// Creates a habit scheduled on every weekday.
    pub fn new(title: &str) -> Result<Self, ValidationError> {
        Self::with_recurrence(title, ALL_WEEKDAYS)
    }

    /// Creates a habit scheduled on the given weekday indices.
    ///
    /// An empty day list falls back to every weekday, matching the add-habit
    /// default.
    pub fn with_recurrence(
        title: &str,
        days: impl IntoIterator<Item = u8>,
    ) -> Result<Self, ValidationError> {
        let mut recurrence_days = BTreeSet::new();
        for day in days {
            if usize::from(day) >= ALL_WEEKDAYS.len() {
                return Err(ValidationError::WeekdayOutOfRange(day));
            }
            recurrence_days.insert(day);
        }
        if recurrence_days.is_empty() {
            recurrence_days.extend(ALL_WEEKDAYS);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_title(title)?,
            recurrence_days,
            completed_dates: BTreeSet::new(),
        })
    }

    /// Returns whether the habit recurs on the weekday of `date`.
    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        self.recurrence_days.contains(&weekday_index(date))
    }

    /// Returns whether the habit has already been checked off on `date`.
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// Packs recurrence days into a 7-bit mask (bit `n` = weekday `n`).
    pub fn recurrence_mask(&self) -> u8 {
        self.recurrence_days
            .iter()
            .filter(|day| usize::from(**day) < ALL_WEEKDAYS.len())
            .fold(0u8, |mask, day| mask | (1 << day))
    }

    /// Unpacks a 7-bit mask produced by `recurrence_mask`.
    pub fn days_from_mask(mask: u8) -> BTreeSet<u8> {
        ALL_WEEKDAYS
            .into_iter()
            .filter(|day| mask & (1 << day) != 0)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if let Some(day) = self
            .recurrence_days
            .iter()
            .find(|day| usize::from(**day) >= ALL_WEEKDAYS.len())
        {
            return Err(ValidationError::WeekdayOutOfRange(*day));
        }
        Ok(())
    }
}
