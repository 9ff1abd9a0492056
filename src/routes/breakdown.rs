use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::ApiResponse;
use crate::error::ReportResult;
use crate::routes::params::{
    accept, dataset_entity, date_or, required_granularity, strict_range, BreakdownQuery,
    DateRangeQuery,
};
use crate::services::reporting::dataset::RoutingKey;
use crate::services::reporting::filter::FilterSpec;
use crate::services::reporting::percentages::OutcomePercentages;
use crate::services::reporting::reports::{self, DailyPercentages};
use crate::services::reporting::store::DatasetKind;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RangePercentages {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub data: Vec<DailyPercentages>,
}

#[utoipa::path(
    get,
    path = "/api/data_breakdown",
    tag = "breakdown",
    params(BreakdownQuery),
    responses(
        (status = 200, description = "Open / non-open / duplicate shares for the period", body = OutcomePercentages),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn data_breakdown(
    State(state): State<AppState>,
    query: Result<Query<BreakdownQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<OutcomePercentages>>> {
    let query = accept(query)?;
    let anchor = date_or(query.date.as_deref(), state.today())?;
    let granularity = required_granularity(query.breakdown_type.as_deref(), "breakdown_type")?;
    let entity = dataset_entity(&state, RoutingKey::JobMetrics, DatasetKind::JobMetrics)?;
    let shares = reports::breakdown_for_period(
        state.store.as_ref(),
        &entity,
        query.source.as_deref(),
        granularity,
        anchor,
    )
    .await?;
    Ok(Json(ApiResponse::success(shares)))
}

#[utoipa::path(
    get,
    path = "/api/data_by_date_range_percentage",
    tag = "breakdown",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Daily open / non-open / duplicate shares", body = RangePercentages),
        (status = 400, description = "Invalid parameters", body = crate::api::ErrorBody),
        (status = 500, description = "Database error", body = crate::api::ErrorBody)
    )
)]
pub(crate) async fn data_by_date_range_percentage(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ReportResult<Json<ApiResponse<RangePercentages>>> {
    let query = accept(query)?;
    let window = strict_range(&query, state.config.max_range_days)?;
    let entity = dataset_entity(&state, RoutingKey::JobMetrics, DatasetKind::JobMetrics)?;
    let filter = FilterSpec::new(query.source.as_deref(), window);
    let data = reports::daily_breakdowns(state.store.as_ref(), &entity, &filter).await?;
    Ok(Json(ApiResponse::success(RangePercentages {
        from_date: window.start(),
        to_date: window.end(),
        data,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data_breakdown", get(data_breakdown))
        .route(
            "/data_by_date_range_percentage",
            get(data_by_date_range_percentage),
        )
}
