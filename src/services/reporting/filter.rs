use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const SOURCE_WILDCARD: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl FromStr for Granularity {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "yearly" => Ok(Granularity::Yearly),
            _ => Err(ReportError::InvalidGranularity(raw.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, ReportError> {
    let trimmed = raw.trim();
    // chrono accepts unpadded fields; a calendar date here is always 10 chars.
    if trimmed.len() != 10 {
        return Err(ReportError::InvalidDateFormat(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT)
        .map_err(|_| ReportError::InvalidDateFormat(raw.to_string()))
}

/// Inclusive calendar-date window. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvertedRange {
                from: start,
                to: end,
            });
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn ensure_max_days(self, max_days: u32) -> Result<Self, ReportError> {
        let days = self.len_days();
        if days > i64::from(max_days) {
            return Err(ReportError::RangeTooLarge { days, max_days });
        }
        Ok(self)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len_days() as usize)
    }
}

/// Validated request filter handed to the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    source: Option<String>,
    window: DateWindow,
}

impl FilterSpec {
    pub fn new(source: Option<&str>, window: DateWindow) -> Self {
        Self {
            source: normalize_source(source),
            window,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }
}

/// `None`, blank, and `all` all mean "every source".
pub fn normalize_source(source: Option<&str>) -> Option<String> {
    source
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .filter(|value| !value.eq_ignore_ascii_case(SOURCE_WILDCARD))
        .map(ToOwned::to_owned)
}
