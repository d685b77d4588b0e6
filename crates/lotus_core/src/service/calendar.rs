//! Month calendar projection over saved rituals.
//!
//! # Responsibility
//! - Compute the month grid facts the calendar view needs.
//! - Map each day of the month to the rituals written on it.
//!
//! # Invariants
//! - Days are 1-based and never exceed `days_in_month`.
//! - Entry order within a day follows store order (newest first).
//! - Entries with unparseable dates are skipped.

use crate::model::ritual::RitualEntry;
use chrono::{Datelike, NaiveDate, TimeZone};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    InvalidMonth { year: i32, month: u32 },
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth { year, month } => {
                write!(f, "invalid calendar month {year}-{month}")
            }
        }
    }
}

impl Error for CalendarError {}

/// Ritual activity for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthActivity {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Weekday of the 1st, Sunday = 0.
    pub first_weekday: u32,
    /// Day of month -> ids of rituals written that day.
    pub days: BTreeMap<u32, Vec<String>>,
}

impl MonthActivity {
    pub fn has_entries(&self, day: u32) -> bool {
        self.days.contains_key(&day)
    }

    pub fn entry_ids(&self, day: u32) -> &[String] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct days carrying at least one ritual.
    pub fn active_days(&self) -> usize {
        self.days.len()
    }
}

/// Builds the activity for `year`/`month`, reading entry dates in `tz`.
pub fn month_activity<Tz: TimeZone>(
    entries: &[RitualEntry],
    tz: &Tz,
    year: i32,
    month: u32,
) -> Result<MonthActivity, CalendarError> {
    let invalid = || CalendarError::InvalidMonth { year, month };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    let mut days: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let Some(created_at) = entry.created_at() else {
            continue;
        };
        let local = created_at.with_timezone(tz).date_naive();
        if local.year() == year && local.month() == month {
            days.entry(local.day()).or_default().push(entry.id.clone());
        }
    }

    Ok(MonthActivity {
        year,
        month,
        days_in_month: next_first.signed_duration_since(first).num_days() as u32,
        first_weekday: first.weekday().num_days_from_sunday(),
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::{month_activity, CalendarError};
    use crate::model::ritual::RitualEntry;
    use chrono::{FixedOffset, Utc};

    fn entry(id: &str, date: &str) -> RitualEntry {
        RitualEntry {
            id: id.to_string(),
            date: date.to_string(),
            content: "content".to_string(),
            summary: "summary".to_string(),
            mood: "Calm".to_string(),
            seed: "seed".to_string(),
        }
    }

    #[test]
    fn grid_facts_for_leap_february() {
        let activity = month_activity(&[], &Utc, 2024, 2).unwrap();
        assert_eq!(activity.days_in_month, 29);
        // 2024-02-01 was a Thursday.
        assert_eq!(activity.first_weekday, 4);
        assert_eq!(activity.active_days(), 0);
    }

    #[test]
    fn december_rolls_into_next_year() {
        let activity = month_activity(&[], &Utc, 2023, 12).unwrap();
        assert_eq!(activity.days_in_month, 31);
        assert_eq!(activity.first_weekday, 5);
    }

    #[test]
    fn entries_grouped_by_day_in_month() {
        let entries = vec![
            entry("3", "2024-05-20T08:00:00.000Z"),
            entry("2", "2024-05-20T06:00:00.000Z"),
            entry("1", "2024-05-02T10:00:00.000Z"),
            entry("0", "2024-04-30T10:00:00.000Z"),
            entry("x", "garbage"),
        ];
        let activity = month_activity(&entries, &Utc, 2024, 5).unwrap();

        assert!(activity.has_entries(20));
        assert_eq!(activity.entry_ids(20), ["3".to_string(), "2".to_string()]);
        assert_eq!(activity.entry_ids(2), ["1".to_string()]);
        assert!(!activity.has_entries(30));
        assert_eq!(activity.active_days(), 2);
    }

    #[test]
    fn time_zone_shifts_entry_day() {
        let entries = vec![entry("1", "2024-05-31T23:30:00.000Z")];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let may = month_activity(&entries, &plus_two, 2024, 5).unwrap();
        assert!(!may.has_entries(31));

        let june = month_activity(&entries, &plus_two, 2024, 6).unwrap();
        assert!(june.has_entries(1));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert_eq!(
            month_activity(&[], &Utc, 2024, 13),
            Err(CalendarError::InvalidMonth {
                year: 2024,
                month: 13
            })
        );
    }
}
