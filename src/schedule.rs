// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurrence rules and the pure next-occurrence calculator.
//!
//! Weekdays are numbered `0..=6` starting at Sunday. Custom cadences use the
//! grammar `every <n> day[s]|week[s]|month[s]`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static CUSTOM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*every\s+(\d+)\s+(day|week|month)s?\s*$").expect("valid custom pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schedule {
    Weekly { day_of_week: u32 },
    Biweekly { day_of_week: u32 },
    Monthly { day_of_month: u32 },
    Custom { pattern: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Days(u32),
    Weeks(u32),
    Months(u32),
}

impl Cadence {
    pub fn parse(pattern: &str) -> Result<Self> {
        let caps = CUSTOM_RE.captures(pattern).ok_or_else(|| {
            Error::InvalidSchedule(format!(
                "'{}' does not match 'every <n> days|weeks|months'",
                pattern
            ))
        })?;
        let n: u32 = caps[1]
            .parse()
            .map_err(|_| Error::InvalidSchedule(format!("count too large in '{}'", pattern)))?;
        if n == 0 {
            return Err(Error::InvalidSchedule(format!(
                "count must be at least 1 in '{}'",
                pattern
            )));
        }
        Ok(match caps[2].to_lowercase().as_str() {
            "day" => Cadence::Days(n),
            "week" => Cadence::Weeks(n),
            _ => Cadence::Months(n),
        })
    }

    fn advance(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cadence::Days(n) => from.checked_add_signed(Duration::days(n as i64)),
            Cadence::Weeks(n) => from.checked_add_signed(Duration::weeks(n as i64)),
            // chrono clamps to the last valid day of the target month
            Cadence::Months(n) => from.checked_add_months(Months::new(n)),
        }
    }
}

impl Schedule {
    /// Checks field ranges without computing anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            Schedule::Weekly { day_of_week } | Schedule::Biweekly { day_of_week } => {
                if *day_of_week > 6 {
                    return Err(Error::InvalidSchedule(format!(
                        "day of week must be 0-6, got {}",
                        day_of_week
                    )));
                }
            }
            Schedule::Monthly { day_of_month } => {
                if !(1..=31).contains(day_of_month) {
                    return Err(Error::InvalidSchedule(format!(
                        "day of month must be 1-31, got {}",
                        day_of_month
                    )));
                }
            }
            Schedule::Custom { pattern } => {
                Cadence::parse(pattern)?;
            }
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        match self {
            Schedule::Weekly { day_of_week } => format!("Weekly on {}", weekday_name(*day_of_week)),
            Schedule::Biweekly { day_of_week } => {
                format!("Every 2 weeks on {}", weekday_name(*day_of_week))
            }
            Schedule::Monthly { day_of_month } => format!("Monthly on day {}", day_of_month),
            Schedule::Custom { pattern } => pattern.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Accepts `weekly:<0-6>`, `biweekly:<0-6>`, `monthly:<1-31>` or a custom
/// `every <n> <unit>` pattern.
impl FromStr for Schedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let schedule = match s.split_once(':') {
            Some((kind, day)) => {
                let day: u32 = day
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidSchedule(format!("invalid day in '{}'", s)))?;
                match kind.trim().to_lowercase().as_str() {
                    "weekly" => Schedule::Weekly { day_of_week: day },
                    "biweekly" => Schedule::Biweekly { day_of_week: day },
                    "monthly" => Schedule::Monthly { day_of_month: day },
                    other => {
                        return Err(Error::InvalidSchedule(format!(
                            "unknown schedule type '{}'",
                            other
                        )));
                    }
                }
            }
            None => Schedule::Custom {
                pattern: s.to_string(),
            },
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

/// Next date on or after `from` that satisfies `schedule`.
///
/// Weekly results land on the requested weekday and may equal `from`.
/// Biweekly results are that aligned date plus 14 days, so the cadence is
/// anchored on whatever date the caller passes in. Monthly results fall in
/// the month after `from`, clamped to the month's last day.
pub fn next_occurrence(schedule: &Schedule, from: NaiveDate) -> Result<NaiveDate> {
    schedule.validate()?;
    let next = match schedule {
        Schedule::Weekly { day_of_week } => Some(align_weekday(from, *day_of_week)),
        Schedule::Biweekly { day_of_week } => {
            align_weekday(from, *day_of_week).checked_add_signed(Duration::days(14))
        }
        Schedule::Monthly { day_of_month } => next_month_day(from, *day_of_month),
        Schedule::Custom { pattern } => Cadence::parse(pattern)?.advance(from),
    };
    next.ok_or_else(|| Error::InvalidSchedule(format!("no occurrence after {}", from)))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next_first = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next_first) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 31,
    }
}

fn align_weekday(from: NaiveDate, day_of_week: u32) -> NaiveDate {
    let current = from.weekday().num_days_from_sunday();
    let offset = (7 + day_of_week - current) % 7;
    from + Duration::days(offset as i64)
}

fn next_month_day(from: NaiveDate, day_of_month: u32) -> Option<NaiveDate> {
    let first_of_next = from.with_day(1)?.checked_add_months(Months::new(1))?;
    let last = days_in_month(first_of_next.year(), first_of_next.month());
    first_of_next.with_day(day_of_month.min(last))
}

fn weekday_name(day_of_week: u32) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_clamps_to_short_month() {
        let s = Schedule::Monthly { day_of_month: 31 };
        assert_eq!(next_occurrence(&s, d(2025, 1, 15)).unwrap(), d(2025, 2, 28));
        assert_eq!(next_occurrence(&s, d(2024, 1, 15)).unwrap(), d(2024, 2, 29));
        assert_eq!(next_occurrence(&s, d(2025, 3, 31)).unwrap(), d(2025, 4, 30));
    }

    #[test]
    fn monthly_rolls_over_year_end() {
        let s = Schedule::Monthly { day_of_month: 5 };
        assert_eq!(next_occurrence(&s, d(2025, 12, 20)).unwrap(), d(2026, 1, 5));
    }

    #[test]
    fn weekly_lands_on_requested_weekday_never_before_start() {
        let s = Schedule::Weekly { day_of_week: 1 };
        let start = d(2025, 6, 1);
        for i in 0..14 {
            let from = start + Duration::days(i);
            let next = next_occurrence(&s, from).unwrap();
            assert_eq!(next.weekday(), Weekday::Mon);
            assert!(next >= from);
            assert!((next - from).num_days() < 7);
        }
    }

    #[test]
    fn biweekly_adds_fourteen_days_after_alignment() {
        // 2025-06-04 is a Wednesday; next Friday is 06-06
        let s = Schedule::Biweekly { day_of_week: 5 };
        assert_eq!(next_occurrence(&s, d(2025, 6, 4)).unwrap(), d(2025, 6, 20));
        // already on Friday: alignment is a no-op
        assert_eq!(next_occurrence(&s, d(2025, 6, 6)).unwrap(), d(2025, 6, 20));
    }

    #[test]
    fn custom_cadences() {
        let every = |p: &str| Schedule::Custom {
            pattern: p.to_string(),
        };
        let from = d(2025, 1, 31);
        assert_eq!(next_occurrence(&every("every 10 days"), from).unwrap(), d(2025, 2, 10));
        assert_eq!(next_occurrence(&every("Every 2 Weeks"), from).unwrap(), d(2025, 2, 14));
        assert_eq!(next_occurrence(&every("every 1 month"), from).unwrap(), d(2025, 2, 28));
        assert!(next_occurrence(&every("every 0 days"), from).is_err());
        assert!(next_occurrence(&every("fortnightly"), from).is_err());
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let from = d(2025, 1, 1);
        assert!(next_occurrence(&Schedule::Weekly { day_of_week: 7 }, from).is_err());
        assert!(next_occurrence(&Schedule::Monthly { day_of_month: 0 }, from).is_err());
        assert!(next_occurrence(&Schedule::Monthly { day_of_month: 32 }, from).is_err());
    }

    #[test]
    fn parses_cli_forms() {
        assert_eq!(
            "weekly:1".parse::<Schedule>().unwrap(),
            Schedule::Weekly { day_of_week: 1 }
        );
        assert_eq!(
            " Monthly : 15 ".parse::<Schedule>().unwrap(),
            Schedule::Monthly { day_of_month: 15 }
        );
        assert_eq!(
            "every 3 weeks".parse::<Schedule>().unwrap(),
            Schedule::Custom {
                pattern: "every 3 weeks".into()
            }
        );
        assert!("yearly:1".parse::<Schedule>().is_err());
        assert!("biweekly:9".parse::<Schedule>().is_err());
    }

    #[test]
    fn schedule_json_shape() {
        let s = Schedule::Biweekly { day_of_week: 5 };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["type"], "biweekly");
        assert_eq!(v["day_of_week"], 5);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
    }
}
