//! # models::position
//!
//! Defines structs for tracking **open positions** and the **fill history**.
//!
//! `Position` = exposure ที่เปิดอยู่ตอนนี้ (หนึ่งตัวต่อ symbol + side)
//! `Fill`     = Log ของทุก execution ที่สำเร็จ (ไม่มีวันลบ)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::command::CommandKind;

// ─── Side ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// `+1.0` for LONG, `-1.0` for SHORT.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Long  => 1.0,
            Side::Short => -1.0,
        }
    }
}

// ─── Position ─────────────────────────────────────────────────────────────────

/// One open exposure. `size` is always > 0 while the position exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol:      String,
    pub side:        Side,
    pub size:        f64,
    /// Quantity-weighted average of every fill that added to the position.
    pub entry_price: f64,
    pub opened_at:   DateTime<Utc>,
}

impl Position {
    pub fn open(symbol: &str, side: Side, size: f64, entry_price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            size,
            entry_price,
            opened_at: Utc::now(),
        }
    }

    /// Add `quantity` filled at `price`, re-averaging the entry.
    pub fn add(&mut self, quantity: f64, price: f64) {
        let new_size = self.size + quantity;
        self.entry_price = (self.entry_price * self.size + price * quantity) / new_size;
        self.size = new_size;
    }

    /// PnL if `quantity` units were closed at `price`.
    #[inline]
    pub fn pnl_at(&self, price: f64, quantity: f64) -> f64 {
        (price - self.entry_price) * quantity * self.side.sign()
    }

    #[inline]
    pub fn unrealized_pnl(&self, mark_price: f64) -> f64 {
        self.pnl_at(mark_price, self.size)
    }
}

/// Read-only copy of a position with its current mark, for API readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionView {
    pub symbol:         String,
    pub side:           Side,
    pub size:           f64,
    pub entry_price:    f64,
    /// `None` when the instrument currently has no price.
    pub mark_price:     Option<f64>,
    pub unrealized_pnl: f64,
    pub opened_at:      DateTime<Utc>,
}

// ─── Fill ─────────────────────────────────────────────────────────────────────

/// Record of one successful execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub trade_id:     Uuid,
    pub kind:         CommandKind,
    pub symbol:       String,
    pub side:         Side,
    pub quantity:     f64,
    /// Fill price after slippage.
    pub price:        f64,
    /// Signed cash movement: negative for opens, positive for closes.
    pub cash_delta:   f64,
    /// Only set for closes.
    pub realized_pnl: Option<f64>,
    /// Size left in the position after this fill (0 = closed).
    pub remaining:    f64,
    pub executed_at:  DateTime<Utc>,
}
