//! Activity-log aggregates: weekly chart and day-labelled timeline.
//!
//! # Invariants
//! - Log input is newest-first; grouped output keeps that order.
//! - Weekly windows are exactly seven consecutive local calendar days.

use crate::constants::WEEK_LEN;
use crate::model::log_entry::LogEntry;
use chrono::{Datelike, Days, NaiveDate};
use std::fmt::{Display, Formatter};

/// Anchor of the seven-day window used by `weekly_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeekStart {
    /// The six days before today, plus today.
    #[default]
    Rolling,
    /// Calendar week starting on the most recent Sunday.
    Sunday,
    /// Calendar week starting on the most recent Monday.
    Monday,
}

impl WeekStart {
    /// First day of the window containing `today`.
    pub fn window_start(self, today: NaiveDate) -> NaiveDate {
        let back = match self {
            Self::Rolling => (WEEK_LEN - 1) as u64,
            Self::Sunday => u64::from(today.weekday().num_days_from_sunday()),
            Self::Monday => u64::from(today.weekday().num_days_from_monday()),
        };
        today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rolling" => Some(Self::Rolling),
            "sunday" | "sun" => Some(Self::Sunday),
            "monday" | "mon" => Some(Self::Monday),
            _ => None,
        }
    }
}

/// Completions recorded on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: u32,
    pub exp: u32,
}

/// Seven-day activity summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyStats {
    /// Oldest day first.
    pub days: Vec<DayBucket>,
    pub total_count: u32,
    pub total_exp: u32,
    /// Largest per-day count, never below 1 so it can scale a chart.
    pub max_count: u32,
}

impl WeeklyStats {
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.days.first()?.date, self.days.last()?.date))
    }
}

/// Buckets `logs` into the seven-day window around `today`.
///
/// Entries outside the window are ignored.
pub fn weekly_stats(logs: &[LogEntry], today: NaiveDate, week_start: WeekStart) -> WeeklyStats {
    let mut days: Vec<DayBucket> = week_start
        .window_start(today)
        .iter_days()
        .take(WEEK_LEN)
        .map(|date| DayBucket {
            date,
            count: 0,
            exp: 0,
        })
        .collect();

    let mut total_count = 0;
    let mut total_exp = 0u32;
    for entry in logs {
        let date = entry.timestamp.date();
        if let Some(bucket) = days.iter_mut().find(|bucket| bucket.date == date) {
            bucket.count += 1;
            bucket.exp = bucket.exp.saturating_add(entry.exp_gained);
            total_count += 1;
            total_exp = total_exp.saturating_add(entry.exp_gained);
        }
    }

    let max_count = days.iter().map(|bucket| bucket.count).max().unwrap_or(0).max(1);
    WeeklyStats {
        days,
        total_count,
        total_exp,
        max_count,
    }
}

/// Timeline heading for a group of log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl DateLabel {
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            Self::Today
        } else if today.pred_opt() == Some(date) {
            Self::Yesterday
        } else {
            Self::Date(date)
        }
    }
}

impl Display for DateLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Yesterday => write!(f, "yesterday"),
            Self::Date(date) => write!(f, "{}", date.format("%b %-d (%a)")),
        }
    }
}

/// Log entries sharing one timeline label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub label: DateLabel,
    pub entries: Vec<LogEntry>,
}

/// Partitions newest-first `logs` into labelled day groups.
///
/// Groups appear in order of their first entry; entries keep input order.
pub fn group_by_date_label(logs: &[LogEntry], today: NaiveDate) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for entry in logs {
        let label = DateLabel::for_date(entry.timestamp.date(), today);
        match groups.iter_mut().find(|group| group.label == label) {
            Some(group) => group.entries.push(entry.clone()),
            None => groups.push(DateGroup {
                label,
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}
