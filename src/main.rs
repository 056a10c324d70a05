//! # TradeSim Alpha — Market Feed, Paper Ledger & AI Mentor Backend
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  ws <sym>@ticker   ┌──────────────────────┐
//!  │  Binance     │ ──────────────────▶│                      │
//!  │  (live leg)  │                    │   FeedAggregator     │──┐
//!  └──────────────┘    1s interval ───▶│   (synthetic leg)    │  │ PRICES_UPDATED
//!                                      └──────────────────────┘  │ LARGE_TRADE
//!  ┌──────────────┐   POST /api/trade          │ snapshot        ▼
//!  │  Dashboard   │ ─────────────────▶ Ledger ◀┘          broadcast_tx ──▶ /ws/monitor
//!  │  (browser)   │   POST /api/mentor/*   │                     ▲
//!  └──────────────┘ ─────────────────▶ IntelligenceProvider ─────┘ COMMENTARY
//!                                       (Claude / OpenAI / Gemini)
//! ```
//!
//! Configuration: see [`config`].

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod events;
mod intelligence;
mod models;
mod routes;
mod state;

use config::AppConfig;
use engine::catalog;
use state::build_state;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — CI/prod can use real env vars) ──────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("tradesim=debug".parse()?)
            .add_directive("tower_http=info".parse()?))
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║         TRADESIM ALPHA — Sim Backend          ║
  ║     Rust + Axum  ·  Feed · Ledger · Mentor    ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Config + shared state ─────────────────────────────────────────────
    let config = AppConfig::from_env()?;
    let addr = config.bind_addr;
    info!(
        mode     = ?config.feed.mode,
        provider = %config.provider.kind,
        mentor   = config.provider.api_key.is_some(),
        "⚙️  Configuration loaded"
    );
    let state = build_state(config);

    // ── 4. Start the market feed with every catalog symbol ──────────────────
    let status = state.feed.connect(&catalog::default_symbols()).await;
    info!(live = status.live.len(), synthetic = status.synthetic.len(), "📡 Market feed started");

    // ── 5. Build CORS layer (allow the dashboard dev server) ────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 6. Router + middleware ───────────────────────────────────────────────
    let app: Router = routes::build_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!(?addr, "🚀 TradeSim server starting");

    // ── 7. Serve until Ctrl-C, then stop the feed tasks ──────────────────────
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("🛑 Shutdown signal received");
        })
        .await?;

    state.feed.disconnect().await;
    info!("👋 Feed stopped, bye");

    Ok(())
}
