//! # state
//!
//! AppState — Feed, Ledger, Mentor, Lesson session และ WebSocket Broadcast
//! Channel ที่ทุก handler ใช้ร่วมกัน
//!
//! ```text
//! FeedAggregator ──(BroadcastSink)──► broadcast_tx ──► /ws/monitor
//! POST /api/trade ──► execute() ──► Ledger (Mutex) ──► broadcast_tx
//!                                              └──► spawn_commentary() ──► broadcast_tx
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    engine::{BinanceConnector, FeedAggregator, FeedSink, Ledger, LedgerError, LiveConnector, PortfolioView},
    events::{TradeSource, WsEvent},
    intelligence::{self, prompt, HttpProvider, IntelligenceProvider, LessonCursor},
    models::{Alert, Fill, InstrumentUpdate, TradeCommand},
};

/// Slow WebSocket clients lag (and skip) past this many queued events.
const BROADCAST_CAPACITY: usize = 256;

// ─── Feed → WebSocket ─────────────────────────────────────────────────────────

/// Forwards feed output to the broadcast channel. `send` never blocks, so it
/// is safe under the feed's lock.
struct BroadcastSink {
    tx: broadcast::Sender<String>,
}

impl FeedSink for BroadcastSink {
    fn on_update(&self, updates: &[InstrumentUpdate]) {
        let _ = self.tx.send(WsEvent::PricesUpdated { updates: updates.to_vec() }.to_json());
    }

    fn on_alert(&self, alert: &Alert) {
        let _ = self.tx.send(WsEvent::LargeTrade { alert: alert.clone() }.to_json());
    }
}

/// A successful command and the cash balance right after it.
#[derive(Debug, Clone, Serialize)]
pub struct Executed {
    pub fill: Fill,
    pub cash: f64,
}

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    pub config:       AppConfig,
    pub feed:         FeedAggregator,
    /// One lock = one command at a time; cash and positions never interleave.
    pub ledger:       Mutex<Ledger>,
    pub mentor:       Arc<dyn IntelligenceProvider>,
    /// Active lesson, `None` when no lesson is running.
    pub lesson:       Mutex<Option<LessonCursor>>,
    pub broadcast_tx: broadcast::Sender<String>,
    pub started_at:   DateTime<Utc>,
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        config: AppConfig,
        connector: Arc<dyn LiveConnector>,
        mentor: Arc<dyn IntelligenceProvider>,
    ) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let sink = Arc::new(BroadcastSink { tx: broadcast_tx.clone() });

        Self {
            feed:       FeedAggregator::new(config.feed.clone(), sink, connector),
            ledger:     Mutex::new(Ledger::new(&config.ledger)),
            mentor,
            lesson:     Mutex::new(None),
            broadcast_tx,
            started_at: Utc::now(),
            config,
        }
    }

    // ── Helper Methods ────────────────────────────────────────────────────────

    /// Broadcast ไปยัง WebSocket clients ทั้งหมด ไม่มี listener ก็ไม่เป็นไร
    pub fn broadcast(&self, event: &WsEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }

    /// Run one command against the latest prices and announce the outcome.
    pub async fn execute(&self, command: &TradeCommand, source: TradeSource) -> Result<Executed, LedgerError> {
        let quotes = self.feed.snapshot().await;
        let (result, cash) = {
            let mut ledger = self.ledger.lock().await;
            let result = ledger.execute(command, &quotes);
            (result, ledger.cash())
        };

        match &result {
            Ok(fill) => self.broadcast(&WsEvent::TradeExecuted {
                source,
                fill: Box::new(fill.clone()),
                cash,
            }),
            Err(e) => self.broadcast(&WsEvent::TradeRejected {
                source,
                command: command.clone(),
                reason: e.to_string(),
            }),
        }
        result.map(|fill| Executed { fill, cash })
    }

    pub async fn portfolio(&self) -> PortfolioView {
        let quotes = self.feed.snapshot().await;
        self.ledger.lock().await.view(&quotes)
    }

    /// Ask the mentor about a fill in the background. The trade is already
    /// applied; the answer (or the fallback) arrives as a COMMENTARY event.
    pub fn spawn_commentary(self: &Arc<Self>, fill: Fill, cash_after: f64) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let situation  = prompt::fill_situation(&fill, cash_after);
            let commentary = intelligence::commentary_or_fallback(state.mentor.as_ref(), &situation).await;
            debug!(trade_id = %fill.trade_id, fallback = commentary.fallback, "🧠 [MENTOR] Commentary ready");
            state.broadcast(&WsEvent::Commentary {
                trade_id: Some(fill.trade_id),
                text:     commentary.text,
                fallback: commentary.fallback,
            });
        });
    }
}

/// Production wiring: Binance for the live leg, HTTP provider for the mentor.
pub fn build_state(config: AppConfig) -> SharedState {
    let connector = Arc::new(BinanceConnector::new(config.live_feed_url.clone()));
    let mentor    = Arc::new(HttpProvider::new(config.provider.clone()));
    if !mentor.is_configured() {
        warn!(provider = %config.provider.kind, "🧠 [MENTOR] AI_API_KEY not set, mentor runs offline");
    }
    Arc::new(AppState::new(config, connector, mentor))
}
