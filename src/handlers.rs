use crate::errors::AppError;
use crate::models::{Counter, PageQuery, TributeCountsResponse, TributeRequest};
use crate::state::AppState;
use crate::ui::{render_index, PageMode};
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Json,
};
use tracing::{error, info};

pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let mut store = state.store.lock().await;
    let counters = store.load_all().await;
    Html(render_index(
        query.lang.unwrap_or_default(),
        query.theme.unwrap_or_default(),
        &counters,
        PageMode::Server,
    ))
}

pub async fn get_tributes(State(state): State<AppState>) -> Json<TributeCountsResponse> {
    let mut store = state.store.lock().await;
    Json(store.load_all().await.into())
}

pub async fn send_tribute(
    State(state): State<AppState>,
    Json(payload): Json<TributeRequest>,
) -> Result<Json<TributeCountsResponse>, AppError> {
    let counter: Counter = payload
        .kind
        .parse()
        .map_err(|_| AppError::bad_request("kind must be 'candle' or 'flower'"))?;

    let response = apply_tribute(&state, counter).await?;
    Ok(Json(response))
}

pub async fn send_candle(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_tribute(&state, Counter::Candles).await?;
    Ok(Redirect::to("/"))
}

pub async fn send_flower(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_tribute(&state, Counter::Flowers).await?;
    Ok(Redirect::to("/"))
}

async fn apply_tribute(
    state: &AppState,
    counter: Counter,
) -> Result<TributeCountsResponse, AppError> {
    let mut store = state.store.lock().await;
    match store.increment(counter).await {
        Ok(value) => {
            info!(%counter, value, "tribute sent");
            Ok(store.counters().into())
        }
        Err(err) => {
            error!(%counter, "failed to persist tribute: {err}");
            Err(err.into())
        }
    }
}
