//! HTTP + WebSocket surface.
//!
//! | Method   | Path                          | Handler                     |
//! |----------|-------------------------------|-----------------------------|
//! | GET      | `/api/health`                 | [`market::health`]          |
//! | GET      | `/api/market/instruments`     | [`market::list_instruments`]|
//! | GET      | `/api/market/instruments/:id` | [`market::get_instrument`]  |
//! | GET      | `/api/market/alerts`          | [`market::get_alerts`]      |
//! | POST     | `/api/market/connect`         | [`market::connect`]         |
//! | POST     | `/api/market/disconnect`      | [`market::disconnect`]      |
//! | POST     | `/api/market/mode`            | [`market::set_mode`]        |
//! | GET      | `/api/portfolio`              | [`trade::get_portfolio`]    |
//! | POST     | `/api/trade`                  | [`trade::execute_trade`]    |
//! | GET      | `/api/trade/history`          | [`trade::get_history`]      |
//! | POST     | `/api/mentor/command`         | [`mentor::mentor_command`]  |
//! | POST     | `/api/mentor/commentary`      | [`mentor::commentary`]      |
//! | POST/GET | `/api/mentor/lesson`          | [`mentor::start_lesson`] / [`mentor::current_lesson`] |
//! | POST     | `/api/mentor/lesson/next`     | [`mentor::next_lesson_step`]|
//! | GET (WS) | `/ws/monitor`                 | [`monitor::ws_monitor`]     |

pub mod market;
pub mod mentor;
pub mod monitor;
pub mod trade;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ── Market Feed ───────────────────────────────────────────────────────
        .route("/api/health",                 get(market::health))
        .route("/api/market/instruments",     get(market::list_instruments))
        .route("/api/market/instruments/:id", get(market::get_instrument))
        .route("/api/market/alerts",          get(market::get_alerts))
        .route("/api/market/connect",         post(market::connect))
        .route("/api/market/disconnect",      post(market::disconnect))
        .route("/api/market/mode",            post(market::set_mode))
        // ── Ledger ────────────────────────────────────────────────────────────
        .route("/api/portfolio",              get(trade::get_portfolio))
        .route("/api/trade",                  post(trade::execute_trade))
        .route("/api/trade/history",          get(trade::get_history))
        // ── Mentor ────────────────────────────────────────────────────────────
        .route("/api/mentor/command",         post(mentor::mentor_command))
        .route("/api/mentor/commentary",      post(mentor::commentary))
        .route("/api/mentor/lesson",          post(mentor::start_lesson).get(mentor::current_lesson))
        .route("/api/mentor/lesson/next",     post(mentor::next_lesson_step))
        // ── Monitor Loop ──────────────────────────────────────────────────────
        .route("/ws/monitor",                 get(monitor::ws_monitor))
        .with_state(state)
}
