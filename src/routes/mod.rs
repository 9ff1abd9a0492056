pub mod breakdown;
pub mod counts;
pub mod health;
pub mod open_counts;
pub mod params;
pub mod series;
pub mod tables;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(tables::router())
                .merge(counts::router())
                .merge(series::router())
                .merge(open_counts::router())
                .merge(breakdown::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
