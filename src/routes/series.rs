//! Single-metric series: inserted record counts and all-storage counts.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::ApiResponse;
use crate::error::ReportResult;
use crate::routes::params::{
    accept, dataset_entity, required_date, required_granularity, strict_range, DateRangeQuery,
    PeriodQuery,
};
use crate::services::reporting::dataset::RoutingKey;
use crate::services::reporting::filter::FilterSpec;
use crate::services::reporting::merge::Series;
use crate::services::reporting::reports;
use crate::services::reporting::store::{DatasetKind, Metric};
use crate::state::AppState;

fn routing_key(metric: Metric) -> RoutingKey {
    match metric.dataset() {
        DatasetKind::JobMetrics => RoutingKey::JobMetrics,
        DatasetKind::ExtractionInfo => RoutingKey::ExtractionInfo,
    }
}

async fn period_series(state: &AppState, metric: Metric, query: PeriodQuery) -> ReportResult<Series> {
    let granularity = required_granularity(query.date_range.as_deref(), "date_range")?;
    let anchor = required_date(query.date.as_deref(), "date")?;
    let entity = dataset_entity(state, routing_key(metric), metric.dataset())?;
    reports::bucketed_series(
        state.store.as_ref(),
        &entity,
        metric,
        query.source.as_deref(),
        granularity,
        anchor,
    )
    .await
}

async fn range_series(state: &AppState, metric: Metric, query: DateRangeQuery) -> ReportResult<Series> {
    let window = strict_range(&query, state.config.max_range_days)?;
    let filter = FilterSpec::new(query.source.as_deref(), window);
    let entity = dataset_entity(state, routing_key(metric), metric.dataset())?;
    reports::range_series(state.store.as_ref(), &entity, metric, &filter).await
}

#[utoipa::path(
    get,
    path = "/api/inserted_record_counts",
    tag = "series",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Inserted records per bucket", body = Vec<crate::services::reporting::merge::SeriesPoint>),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn inserted_record_counts(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<Series>>> {
    let query = accept(query)?;
    let series = period_series(&state, Metric::InsertedRecords, query).await?;
    Ok(Json(ApiResponse::success(series)))
}

#[utoipa::path(
    get,
    path = "/api/inserted_counts_by_date_range",
    tag = "series",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Inserted records per day", body = Vec<crate::services::reporting::merge::SeriesPoint>),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn inserted_counts_by_date_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<Series>>> {
    let query = accept(query)?;
    let series = range_series(&state, Metric::InsertedRecords, query).await?;
    Ok(Json(ApiResponse::success(series)))
}

#[utoipa::path(
    get,
    path = "/api/allstorage_counts",
    tag = "series",
    params(PeriodQuery),
    responses(
        (status = 200, description = "All-storage count per bucket", body = Vec<crate::services::reporting::merge::SeriesPoint>),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn allstorage_counts(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<Series>>> {
    let query = accept(query)?;
    let series = period_series(&state, Metric::AllStorage, query).await?;
    Ok(Json(ApiResponse::success(series)))
}

#[utoipa::path(
    get,
    path = "/api/allstorage_date_range",
    tag = "series",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "All-storage count per day", body = Vec<crate::services::reporting::merge::SeriesPoint>),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn allstorage_date_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<Series>>> {
    let query = accept(query)?;
    let series = range_series(&state, Metric::AllStorage, query).await?;
    Ok(Json(ApiResponse::success(series)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inserted_record_counts", get(inserted_record_counts))
        .route("/inserted_counts_by_date_range", get(inserted_counts_by_date_range))
        .route("/allstorage_counts", get(allstorage_counts))
        .route("/allstorage_date_range", get(allstorage_date_range))
}
