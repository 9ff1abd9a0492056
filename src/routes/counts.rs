use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::ApiResponse;
use crate::error::ReportResult;
use crate::routes::params::{
    accept, dataset_entity, date_or, lenient_range, DateRangeQuery, SingleDateQuery,
};
use crate::services::reporting::dataset::RoutingKey;
use crate::services::reporting::filter::{DateWindow, FilterSpec};
use crate::services::reporting::reports::{self, SummaryCounts};
use crate::services::reporting::store::DatasetKind;
use crate::state::AppState;

async fn count(state: &AppState, filter: FilterSpec) -> ReportResult<SummaryCounts> {
    let job_metrics = dataset_entity(state, RoutingKey::Combined, DatasetKind::JobMetrics)?;
    let extraction_info = dataset_entity(state, RoutingKey::Combined, DatasetKind::ExtractionInfo)?;
    reports::summary_counts(state.store.as_ref(), &job_metrics, &extraction_info, &filter).await
}

#[utoipa::path(
    get,
    path = "/api/summary_counts",
    tag = "counts",
    params(SingleDateQuery),
    responses(
        (status = 200, description = "Metric totals for one day", body = SummaryCounts),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn summary_counts(
    State(state): State<AppState>,
    query: Result<Query<SingleDateQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<SummaryCounts>>> {
    let query = accept(query)?;
    let date = date_or(query.date.as_deref(), state.today())?;
    let filter = FilterSpec::new(query.source.as_deref(), DateWindow::single(date));
    Ok(Json(ApiResponse::success(count(&state, filter).await?)))
}

#[utoipa::path(
    get,
    path = "/api/summary_counts_date_range",
    tag = "counts",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Metric totals over a date range", body = SummaryCounts),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn summary_counts_date_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<SummaryCounts>>> {
    let query = accept(query)?;
    let window = lenient_range(&query, state.today(), state.config.max_range_days)?;
    let filter = FilterSpec::new(query.source.as_deref(), window);
    Ok(Json(ApiResponse::success(count(&state, filter).await?)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary_counts", get(summary_counts))
        .route("/summary_counts_date_range", get(summary_counts_date_range))
}
