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
use crate::services::reporting::reports::{self, TablesSummary};
use crate::services::reporting::store::DatasetKind;
use crate::state::AppState;

async fn summarize(state: &AppState, filter: FilterSpec) -> ReportResult<TablesSummary> {
    let entity = dataset_entity(state, RoutingKey::ExtractionInfo, DatasetKind::ExtractionInfo)?;
    reports::tables_summary(state.store.as_ref(), &entity, &filter).await
}

#[utoipa::path(
    get,
    path = "/api/tables_summary_single_date",
    tag = "tables",
    params(SingleDateQuery),
    responses(
        (status = 200, description = "Table extraction summary for one day", body = TablesSummary),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn tables_summary_single_date(
    State(state): State<AppState>,
    query: Result<Query<SingleDateQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<TablesSummary>>> {
    let query = accept(query)?;
    let date = date_or(query.date.as_deref(), state.today())?;
    let filter = FilterSpec::new(query.source.as_deref(), DateWindow::single(date));
    Ok(Json(ApiResponse::success(summarize(&state, filter).await?)))
}

#[utoipa::path(
    get,
    path = "/api/tables_summary_date_range",
    tag = "tables",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Table extraction summary over a date range", body = TablesSummary),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn tables_summary_date_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<TablesSummary>>> {
    let query = accept(query)?;
    let window = lenient_range(&query, state.today(), state.config.max_range_days)?;
    let filter = FilterSpec::new(query.source.as_deref(), window);
    Ok(Json(ApiResponse::success(summarize(&state, filter).await?)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables_summary_single_date", get(tables_summary_single_date))
        .route("/tables_summary_date_range", get(tables_summary_date_range))
}
