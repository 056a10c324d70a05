//! Domain models shared across the TradeSim core.

pub mod alert;
pub mod command;
pub mod instrument;
pub mod position;

pub use alert::{Alert, AlertLog, AlertSide};
pub use command::{CommandKind, TradeCommand};
pub use instrument::{AssetClass, Instrument, InstrumentUpdate, Trend};
pub use position::{Fill, Position, PositionView, Side};
