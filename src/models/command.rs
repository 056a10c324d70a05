//! # models::command
//!
//! [`TradeCommand`] — คำสั่งเทรดที่ Ledger รับ ไม่ว่าจะมาจาก user หรือจาก AI
//! mentor ก็ต้องผ่าน validation ชุดเดียวกัน

use serde::{Deserialize, Serialize};

use crate::models::position::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    OpenLong,
    OpenShort,
    Close,
}

impl CommandKind {
    /// Side a command opens. `None` for CLOSE.
    pub fn opening_side(self) -> Option<Side> {
        match self {
            CommandKind::OpenLong  => Some(Side::Long),
            CommandKind::OpenShort => Some(Side::Short),
            CommandKind::Close     => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCommand {
    pub kind:     CommandKind,
    pub symbol:   String,
    pub quantity: f64,
    /// CLOSE only: which side to close when both are open. Without it the
    /// oldest position for the symbol is closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side:     Option<Side>,
}

impl TradeCommand {
    pub fn open_long(symbol: &str, quantity: f64) -> Self {
        Self { kind: CommandKind::OpenLong, symbol: symbol.to_string(), quantity, side: None }
    }

    pub fn open_short(symbol: &str, quantity: f64) -> Self {
        Self { kind: CommandKind::OpenShort, symbol: symbol.to_string(), quantity, side: None }
    }

    pub fn close(symbol: &str, quantity: f64) -> Self {
        Self { kind: CommandKind::Close, symbol: symbol.to_string(), quantity, side: None }
    }
}
