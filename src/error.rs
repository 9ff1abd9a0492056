use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;

use crate::api::ErrorBody;

/// Failures surfaced at the request boundary.
///
/// Everything except `UpstreamFetch` is a client mistake and maps to 400.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid date format '{0}'. Use YYYY-MM-DD.")]
    InvalidDateFormat(String),
    #[error("Invalid date_range '{0}'. Choose from 'daily', 'weekly', 'monthly', or 'yearly'.")]
    InvalidGranularity(String),
    #[error("from_date ({from}) cannot be after to_date ({to})")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
    #[error("Requested range spans {days} days (max {max_days})")]
    RangeTooLarge { days: i64, max_days: u32 },
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error("Missing required query parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Unknown routing key '{0}'")]
    UnknownRoutingKey(String),
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),
}

impl ReportError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, ReportError::UpstreamFetch(_))
    }

    pub fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ReportError::UpstreamFetch(_) => {
                tracing::error!(error = %self, "report request failed");
                "Database error".to_string()
            }
            other => {
                tracing::debug!(error = %other, "rejected report request");
                other.to_string()
            }
        };
        (status, Json(ErrorBody::new(detail))).into_response()
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

pub fn map_db_error(err: sqlx::Error) -> ReportError {
    let code = match &err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    };
    tracing::error!(error = %err, code = ?code, "database error");
    ReportError::UpstreamFetch(err.to_string())
}
