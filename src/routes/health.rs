use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct BannerResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = HealthResponse))
)]
pub(crate) async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = BannerResponse))
)]
pub(crate) async fn root_handler() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Extraction pipeline reporting API".to_string(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/healthz", get(healthz_handler))
}
