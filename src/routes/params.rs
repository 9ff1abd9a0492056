//! Query-string shapes shared by the report endpoints and their validation.
//!
//! Every field is optional at the extractor level and handlers take the
//! extractor as a `Result`, so missing values, malformed values and undecodable
//! query strings all surface as `ReportError` envelopes.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use chrono::NaiveDate;

use crate::error::{ReportError, ReportResult};
use crate::services::reporting::dataset::{EntitySpec, RoutingKey};
use crate::services::reporting::filter::{parse_iso_date, DateWindow, Granularity};
use crate::services::reporting::store::DatasetKind;
use crate::state::AppState;

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct SingleDateQuery {
    /// Source system; omitted, empty, or `all` means every source.
    pub source: Option<String>,
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct DateRangeQuery {
    pub source: Option<String>,
    /// Inclusive start, `YYYY-MM-DD`.
    pub from_date: Option<String>,
    /// Inclusive end, `YYYY-MM-DD`.
    pub to_date: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct PeriodQuery {
    /// One of `daily`, `weekly`, `monthly`, `yearly`.
    pub date_range: Option<String>,
    pub source: Option<String>,
    /// Anchor date, `YYYY-MM-DD`.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct BreakdownQuery {
    pub source: Option<String>,
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
    /// One of `daily`, `weekly`, `monthly`, `yearly`.
    pub breakdown_type: Option<String>,
}

pub(crate) fn accept<T>(query: Result<Query<T>, QueryRejection>) -> ReportResult<T> {
    match query {
        Ok(Query(query)) => Ok(query),
        Err(rejection) => Err(ReportError::InvalidQuery(rejection.body_text())),
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn required<'a>(raw: Option<&'a str>, name: &'static str) -> ReportResult<&'a str> {
    present(raw).ok_or(ReportError::MissingParameter(name))
}

pub(crate) fn required_date(raw: Option<&str>, name: &'static str) -> ReportResult<NaiveDate> {
    parse_iso_date(required(raw, name)?)
}

pub(crate) fn date_or(raw: Option<&str>, fallback: NaiveDate) -> ReportResult<NaiveDate> {
    present(raw).map_or(Ok(fallback), parse_iso_date)
}

pub(crate) fn required_granularity(
    raw: Option<&str>,
    name: &'static str,
) -> ReportResult<Granularity> {
    required(raw, name)?.parse()
}

/// Both bounds must be supplied.
pub(crate) fn strict_range(query: &DateRangeQuery, max_days: u32) -> ReportResult<DateWindow> {
    let from = required_date(query.from_date.as_deref(), "from_date")?;
    let to = required_date(query.to_date.as_deref(), "to_date")?;
    DateWindow::new(from, to)?.ensure_max_days(max_days)
}

/// A missing bound copies the other one; with neither, the window is `today`.
pub(crate) fn lenient_range(
    query: &DateRangeQuery,
    today: NaiveDate,
    max_days: u32,
) -> ReportResult<DateWindow> {
    let from = present(query.from_date.as_deref());
    let to = present(query.to_date.as_deref());
    let (from, to) = match (from, to) {
        (None, None) => (today, today),
        (Some(from), None) => {
            let from = parse_iso_date(from)?;
            (from, from)
        }
        (None, Some(to)) => {
            let to = parse_iso_date(to)?;
            (to, to)
        }
        (Some(from), Some(to)) => (parse_iso_date(from)?, parse_iso_date(to)?),
    };
    DateWindow::new(from, to)?.ensure_max_days(max_days)
}

pub(crate) fn dataset_entity(
    state: &AppState,
    key: RoutingKey,
    kind: DatasetKind,
) -> ReportResult<EntitySpec> {
    state
        .datasets()
        .resolve(key)
        .entity(kind)
        .cloned()
        .ok_or_else(|| ReportError::UnknownRoutingKey(key.as_str().to_string()))
}
