//! # routes::market
//!
//! **Market Feed** — snapshot อ่านราคา + ควบคุม session ของ Feed

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    engine::{catalog, FeedMode},
    error::AppError,
    events::WsEvent,
    state::SharedState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    /// Missing = every catalog symbol.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

/// GET /api/health — liveness + feed / ledger summary
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let feed      = state.feed.status().await;
    let portfolio = state.portfolio().await;
    let uptime    = (chrono::Utc::now() - state.started_at).num_seconds();

    Json(json!({
        "ok":          true,
        "status":      "healthy",
        "uptime_secs": uptime,
        "feed":        feed,
        "mentor":      state.mentor.name(),
        "cash":        portfolio.cash,
        "equity":      portfolio.equity,
        "positions":   portfolio.positions.len(),
    }))
}

/// GET /api/market/instruments
pub async fn list_instruments(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.feed.snapshot().await;
    Json(json!({
        "ok":          true,
        "count":       snapshot.instruments.len(),
        "instruments": snapshot.instruments,
    }))
}

/// GET /api/market/instruments/:id
pub async fn get_instrument(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = id.to_uppercase();
    let instrument = state
        .feed
        .instrument(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("instrument {id}")))?;

    Ok(Json(json!({ "ok": true, "instrument": instrument })))
}

/// GET /api/market/alerts — recent large-trade alerts, oldest first
pub async fn get_alerts(State(state): State<SharedState>) -> impl IntoResponse {
    let alerts = state.feed.recent_alerts().await;
    Json(json!({ "ok": true, "count": alerts.len(), "alerts": alerts }))
}

/// POST /api/market/connect — (re)start the feed session
pub async fn connect(
    State(state): State<SharedState>,
    body: Option<Json<ConnectRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let symbols = request.symbols.unwrap_or_else(catalog::default_symbols);

    let status = state.feed.connect(&symbols).await;
    state.broadcast(&WsEvent::FeedStatusChanged { status: status.clone() });

    Json(json!({ "ok": true, "status": status }))
}

/// POST /api/market/disconnect
pub async fn disconnect(State(state): State<SharedState>) -> impl IntoResponse {
    state.feed.disconnect().await;
    let status = state.feed.status().await;
    state.broadcast(&WsEvent::FeedStatusChanged { status: status.clone() });

    Json(json!({ "ok": true, "status": status }))
}

/// POST /api/market/mode — switch live ↔ simulation, rebuild, reconnect
pub async fn set_mode(
    State(state): State<SharedState>,
    Json(request): Json<ModeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mode: FeedMode = request.mode.parse().map_err(AppError::BadRequest)?;

    state.feed.set_mode(mode).await;
    let status = state.feed.connect(&catalog::default_symbols()).await;
    info!(mode = ?mode, "🔀 Feed mode switched via API");
    state.broadcast(&WsEvent::FeedStatusChanged { status: status.clone() });

    Ok(Json(json!({ "ok": true, "status": status })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::{build_router, test_support::*};

    #[tokio::test]
    async fn test_instruments_and_lookup() {
        let app = build_router(test_state(Arc::new(CannedMentor::default())));

        let (status, body) = send(&app, "GET", "/api/market/instruments", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 11);

        let (status, body) = send(&app, "GET", "/api/market/instruments/btcusdt", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["instrument"]["price"], 94_850.0);
        assert_eq!(body["instrument"]["history"].as_array().unwrap().len(), 20);

        let (status, body) = send(&app, "GET", "/api/market/instruments/DOGEUSDT", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_connect_mode_and_disconnect() {
        let state = test_state(Arc::new(CannedMentor::default()));
        let app = build_router(state.clone());

        let (status, body) = send(&app, "POST", "/api/market/connect", Some(json!({ "symbols": ["BTCUSDT", "TSLA"] }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["active"], true);
        assert_eq!(body["status"]["live"], json!(["BTCUSDT"]));
        assert_eq!(body["status"]["synthetic"], json!(["TSLA"]));

        let (status, body) = send(&app, "POST", "/api/market/mode", Some(json!({ "mode": "simulation" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"]["mode"], "SIMULATION");
        assert_eq!(body["status"]["live"], json!([]));

        let (status, _) = send(&app, "POST", "/api/market/mode", Some(json!({ "mode": "paper" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "POST", "/api/market/disconnect", None).await;
        assert_eq!(body["status"]["active"], false);
        assert!(!state.feed.status().await.active);
    }

    #[tokio::test]
    async fn test_health_reports_ledger() {
        let app = build_router(test_state(Arc::new(CannedMentor::default())));
        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cash"], 100_000.0);
        assert_eq!(body["mentor"], "canned");
    }
}
