//! Group keys for time-series aggregation.

use chrono::{Datelike, NaiveDate};
use pulse_core::types::{Granularity, GroupingStrategy};
use serde::{Serialize, Serializer};

/// Key a record is bucketed under. Ordering follows the natural calendar
/// order within one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Day(NaiveDate),
    /// `year` is `None` under the year-agnostic strategy.
    Week { year: Option<i32>, week: u32 },
    Month { year: Option<i32>, month: u32 },
}

impl GroupKey {
    pub fn for_date(date: NaiveDate, granularity: Granularity, strategy: GroupingStrategy) -> Self {
        match (granularity, strategy) {
            (Granularity::Day, _) => GroupKey::Day(date),
            (Granularity::Week, GroupingStrategy::YearAgnostic) => GroupKey::Week {
                year: None,
                week: sunday_week_of_year(date),
            },
            (Granularity::Week, GroupingStrategy::YearQualified) => {
                let iso = date.iso_week();
                GroupKey::Week {
                    year: Some(iso.year()),
                    week: iso.week(),
                }
            }
            (Granularity::Month, GroupingStrategy::YearAgnostic) => GroupKey::Month {
                year: None,
                month: date.month(),
            },
            (Granularity::Month, GroupingStrategy::YearQualified) => GroupKey::Month {
                year: Some(date.year()),
                month: date.month(),
            },
        }
    }
}

/// Week of the year with weeks starting on Sunday; days before the first
/// Sunday belong to week 0 (strftime `%U`).
pub fn sunday_week_of_year(date: NaiveDate) -> u32 {
    let day_of_year = date.ordinal0();
    let weekday = date.weekday().num_days_from_sunday();
    (day_of_year + 7 - weekday) / 7
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GroupKey::Day(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            GroupKey::Week { year: None, week } => serializer.serialize_u32(*week),
            GroupKey::Week {
                year: Some(year),
                week,
            } => serializer.collect_str(&format_args!("{year}-W{week:02}")),
            GroupKey::Month { year: None, month } => serializer.serialize_u32(*month),
            GroupKey::Month {
                year: Some(year),
                month,
            } => serializer.collect_str(&format_args!("{year}-{month:02}")),
        }
    }
}
