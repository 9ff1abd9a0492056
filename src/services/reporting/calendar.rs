//! Canonical bucket sets for a request.
//!
//! The buckets a response must contain depend only on the granularity and the
//! anchor date (or explicit range), never on what the store returns.
//!
//! Weekly windows start on the Monday of the anchor's ISO week and cover seven
//! days. Every weekly endpoint uses the same rule.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::filter::{DateWindow, Granularity};

pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: i64 = 7;
pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, utoipa::ToSchema,
)]
pub enum BucketKey {
    #[serde(rename = "hour")]
    Hour(u32),
    #[serde(rename = "date")]
    CalendarDate(NaiveDate),
    #[serde(rename = "month")]
    MonthOfYear(u32),
}

/// Column the store groups by to produce rows for a bucket set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingDimension {
    HourOfDay,
    CalendarDate,
    MonthOfYear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPlan {
    pub dimension: GroupingDimension,
    pub window: DateWindow,
    pub keys: Vec<BucketKey>,
}

impl BucketPlan {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn buckets(granularity: Granularity, anchor: NaiveDate) -> BucketPlan {
    let window = window_for(granularity, anchor);
    match granularity {
        Granularity::Daily => BucketPlan {
            dimension: GroupingDimension::HourOfDay,
            window,
            keys: (0..HOURS_PER_DAY).map(BucketKey::Hour).collect(),
        },
        Granularity::Weekly | Granularity::Monthly => date_plan(window),
        Granularity::Yearly => BucketPlan {
            dimension: GroupingDimension::MonthOfYear,
            window,
            keys: (1..=MONTHS_PER_YEAR).map(BucketKey::MonthOfYear).collect(),
        },
    }
}

/// One `CalendarDate` bucket per day of an explicit range.
pub fn range_buckets(window: DateWindow) -> BucketPlan {
    date_plan(window)
}

fn date_plan(window: DateWindow) -> BucketPlan {
    BucketPlan {
        dimension: GroupingDimension::CalendarDate,
        window,
        keys: window.days().map(BucketKey::CalendarDate).collect(),
    }
}

/// Inclusive date span a granularity covers around `anchor`.
pub fn window_for(granularity: Granularity, anchor: NaiveDate) -> DateWindow {
    let (start, end) = match granularity {
        Granularity::Daily => (anchor, anchor),
        Granularity::Weekly => {
            let start = week_start(anchor);
            (start, start + Duration::days(DAYS_PER_WEEK - 1))
        }
        Granularity::Monthly => {
            let start = anchor.with_day(1).unwrap_or(anchor);
            let last = days_in_month(anchor.year(), anchor.month());
            (start, anchor.with_day(last).unwrap_or(anchor))
        }
        Granularity::Yearly => (
            NaiveDate::from_ymd_opt(anchor.year(), 1, 1).unwrap_or(anchor),
            NaiveDate::from_ymd_opt(anchor.year(), 12, 31).unwrap_or(anchor),
        ),
    };
    DateWindow::new(start, end).unwrap_or_else(|_| DateWindow::single(anchor))
}

pub fn week_start(anchor: NaiveDate) -> NaiveDate {
    anchor - Duration::days(i64::from(anchor.weekday().num_days_from_monday()))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
