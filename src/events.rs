//! # events
//!
//! Defines [`WsEvent`] — ทุก Event ที่ระบบ Broadcast ออกไปผ่าน WebSocket
//! ไปยัง Dashboard (`/ws/monitor`)
//!
//! Events are serialized to JSON once and sent as `String` over the
//! `tokio::sync::broadcast` channel, so subscribers never clone the payloads.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    engine::{FeedStatus, PortfolioView},
    intelligence::LessonProgress,
    models::{Alert, Fill, Instrument, InstrumentUpdate, TradeCommand},
};

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSource {
    Manual,
    Mentor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsEvent {
    /// ส่งครั้งแรกทันทีที่ client ต่อเข้ามา
    Snapshot {
        feed:        FeedStatus,
        instruments: Vec<Instrument>,
        portfolio:   Box<PortfolioView>,
        alerts:      Vec<Alert>,
    },

    /// One tick worth of partial updates.
    PricesUpdated {
        updates: Vec<InstrumentUpdate>,
    },

    /// Synthetic whale alert.
    LargeTrade {
        alert: Alert,
    },

    TradeExecuted {
        source: TradeSource,
        fill:   Box<Fill>,
        cash:   f64,
    },

    TradeRejected {
        source:  TradeSource,
        command: TradeCommand,
        reason:  String,
    },

    /// Mentor commentary, usually about the trade named by `trade_id`.
    Commentary {
        trade_id: Option<Uuid>,
        text:     String,
        fallback: bool,
    },

    LessonStep {
        progress: LessonProgress,
    },

    /// The last lesson step was advanced past; practice is unlocked.
    ModuleComplete {
        topic: String,
    },

    /// Session started, stopped or the mode changed.
    FeedStatusChanged {
        status: FeedStatus,
    },
}

impl WsEvent {
    /// แปลงเป็น JSON String สำหรับส่งผ่าน WebSocket
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
