//! # routes::trade
//!
//! Manual trading against the paper ledger.
//!
//! Every accepted command is broadcast as `TRADE_EXECUTED` and then handed
//! to the mentor for commentary in the background; the HTTP response never
//! waits for the AI.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use crate::{error::AppError, events::TradeSource, models::TradeCommand, state::SharedState};

/// GET /api/portfolio — cash, equity and marked positions
pub async fn get_portfolio(State(state): State<SharedState>) -> impl IntoResponse {
    let portfolio = state.portfolio().await;
    Json(json!({ "ok": true, "portfolio": portfolio }))
}

/// POST /api/trade
pub async fn execute_trade(
    State(state): State<SharedState>,
    Json(mut command): Json<TradeCommand>,
) -> Result<impl IntoResponse, AppError> {
    command.symbol = command.symbol.trim().to_uppercase();
    if command.symbol.is_empty() {
        return Err(AppError::BadRequest("symbol is required".into()));
    }

    let executed = state.execute(&command, TradeSource::Manual).await?;
    info!(
        trade_id = %executed.fill.trade_id,
        symbol   = %executed.fill.symbol,
        cash     = executed.cash,
        "📝 Manual trade executed"
    );
    state.spawn_commentary(executed.fill.clone(), executed.cash);

    Ok(Json(json!({
        "ok":   true,
        "fill": executed.fill,
        "cash": executed.cash,
    })))
}

/// GET /api/trade/history — every fill, oldest first
pub async fn get_history(State(state): State<SharedState>) -> impl IntoResponse {
    let fills = state.ledger.lock().await.fills().to_vec();
    Json(json!({ "ok": true, "count": fills.len(), "fills": fills }))
}
