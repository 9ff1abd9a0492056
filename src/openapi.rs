use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::api::ErrorBody;
use crate::routes::breakdown::RangePercentages;
use crate::routes::health::{BannerResponse, HealthResponse};
use crate::routes::{breakdown, counts, health, open_counts, series, tables};
use crate::services::reporting::calendar::BucketKey;
use crate::services::reporting::merge::SeriesPoint;
use crate::services::reporting::percentages::OutcomePercentages;
use crate::services::reporting::reconcile::EntityPair;
use crate::services::reporting::reports::{
    DailyPercentages, OpenNonOpenPoint, OutcomeList, SummaryCounts, TableList, TablesSummary,
};
use crate::services::reporting::store::OutcomeRecord;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Extraction Report API",
        description = "Bucketed metrics, table reconciliation and outcome shares for the extraction pipeline. \
Successful responses are wrapped as {\"status\": \"success\", \"data\": ...}."
    ),
    paths(
        health::root_handler,
        health::healthz_handler,
        tables::tables_summary_single_date,
        tables::tables_summary_date_range,
        counts::summary_counts,
        counts::summary_counts_date_range,
        series::inserted_record_counts,
        series::inserted_counts_by_date_range,
        series::allstorage_counts,
        series::allstorage_date_range,
        open_counts::open_non_open_counts,
        open_counts::open_non_open_counts_by_date_range,
        breakdown::data_breakdown,
        breakdown::data_by_date_range_percentage,
    ),
    components(schemas(
        ErrorBody,
        HealthResponse,
        BannerResponse,
        BucketKey,
        SeriesPoint,
        OpenNonOpenPoint,
        OutcomePercentages,
        DailyPercentages,
        RangePercentages,
        SummaryCounts,
        EntityPair,
        OutcomeRecord,
        TableList,
        OutcomeList,
        TablesSummary,
    )),
    tags(
        (name = "tables", description = "Per-table extraction outcomes"),
        (name = "counts", description = "Metric totals"),
        (name = "series", description = "Zero-filled metric series"),
        (name = "open_counts", description = "Open versus non-open counts"),
        (name = "breakdown", description = "Outcome percentage shares")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
