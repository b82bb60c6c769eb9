use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tribute/candle", post(handlers::send_candle))
        .route("/tribute/flower", post(handlers::send_flower))
        .route(
            "/api/tributes",
            get(handlers::get_tributes).post(handlers::send_tribute),
        )
        .with_state(state)
}
