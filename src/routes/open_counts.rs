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
use crate::services::reporting::calendar;
use crate::services::reporting::dataset::RoutingKey;
use crate::services::reporting::reports::{self, OpenNonOpenPoint};
use crate::services::reporting::store::DatasetKind;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/open_non_open_counts",
    tag = "open_counts",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Open and non-open counts per bucket", body = Vec<OpenNonOpenPoint>),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn open_non_open_counts(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<Vec<OpenNonOpenPoint>>>> {
    let query = accept(query)?;
    let granularity = required_granularity(query.date_range.as_deref(), "date_range")?;
    let anchor = required_date(query.date.as_deref(), "date")?;
    let entity = dataset_entity(&state, RoutingKey::JobMetrics, DatasetKind::JobMetrics)?;
    let plan = calendar::buckets(granularity, anchor);
    let points = reports::open_non_open_series(
        state.store.as_ref(),
        &entity,
        query.source.as_deref(),
        &plan,
    )
    .await?;
    Ok(Json(ApiResponse::success(points)))
}

#[utoipa::path(
    get,
    path = "/api/open_non_open_counts_by_date_range",
    tag = "open_counts",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Open and non-open counts per day", body = Vec<OpenNonOpenPoint>),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn open_non_open_counts_by_date_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<Vec<OpenNonOpenPoint>>>> {
    let query = accept(query)?;
    let window = strict_range(&query, state.config.max_range_days)?;
    let entity = dataset_entity(&state, RoutingKey::JobMetrics, DatasetKind::JobMetrics)?;
    let plan = calendar::range_buckets(window);
    let points = reports::open_non_open_series(
        state.store.as_ref(),
        &entity,
        query.source.as_deref(),
        &plan,
    )
    .await?;
    Ok(Json(ApiResponse::success(points)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/open_non_open_counts", get(open_non_open_counts))
        .route(
            "/open_non_open_counts_by_date_range",
            get(open_non_open_counts_by_date_range),
        )
}
