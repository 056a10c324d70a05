//! # engine::ledger
//!
//! **Portfolio Ledger** — เงินสด + Position ที่เปิดอยู่ + PnL
//!
//! ## ลำดับการตรวจสอบ (ทุก Command)
//! ```text
//! 1. quantity > 0                       → InvalidQuantity
//! 2. instrument มีราคา (> 0)             → NoLiquidity
//! 3a. OPEN:  cost ≤ cash                → InsufficientFunds
//! 3b. CLOSE: มี Position ของ symbol นี้   → NoPosition
//! 4. → apply (cash + positions เปลี่ยนพร้อมกัน)
//! ```
//!
//! Every check runs before the first write, so a rejected command leaves the
//! ledger exactly as it was.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{CommandKind, Fill, Position, PositionView, Side, TradeCommand};

/// A CLOSE within this fraction of the open size closes the whole position,
/// so float residue from averaged adds never leaves a dust position behind.
const SIZE_DUST_RATIO: f64 = 1e-9;

// ─── Quotes ───────────────────────────────────────────────────────────────────

/// Read access to current prices. Implemented by the feed's market snapshot.
pub trait Quotes {
    /// Latest price for `symbol`, `None` if unknown.
    fn price_of(&self, symbol: &str) -> Option<f64>;
}

impl Quotes for std::collections::HashMap<String, f64> {
    fn price_of(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).copied()
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Validation failures. Each names the precondition that failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("invalid quantity {0}: must be a positive number")]
    InvalidQuantity(f64),

    #[error("no liquidity: {0} has no current price")]
    NoLiquidity(String),

    #[error("insufficient funds: required ${required:.2}, available ${available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("no position: nothing open for {0} to close")]
    NoPosition(String),
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub starting_cash: f64,
    /// Multiplicative fill penalty. Buys fill at `price × slippage`, sells at
    /// `price ÷ slippage`. `1.0` = no slippage.
    pub slippage:      f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { starting_cash: 100_000.0, slippage: 1.0 }
    }
}

// ─── Views ────────────────────────────────────────────────────────────────────

/// Copy of the ledger marked against current prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub cash:           f64,
    pub equity:         f64,
    pub realized_pnl:   f64,
    pub unrealized_pnl: f64,
    pub positions:      Vec<PositionView>,
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash:         f64,
    positions:    Vec<Position>,
    realized_pnl: f64,
    slippage:     f64,
    fills:        Vec<Fill>,
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            cash:         config.starting_cash,
            positions:    Vec::new(),
            realized_pnl: 0.0,
            slippage:     if config.slippage.is_finite() && config.slippage > 0.0 { config.slippage } else { 1.0 },
            fills:        Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    // ─── Execute ──────────────────────────────────────────────────────────────

    /// Validate and apply one command against `quotes`.
    pub fn execute(&mut self, cmd: &TradeCommand, quotes: &impl Quotes) -> Result<Fill, LedgerError> {
        let result = self.try_execute(cmd, quotes);
        match &result {
            Ok(fill) => info!(
                kind      = ?fill.kind,
                symbol    = %fill.symbol,
                side      = ?fill.side,
                quantity  = fill.quantity,
                price     = fill.price,
                cash      = self.cash,
                pnl       = ?fill.realized_pnl,
                "💱 [LEDGER] Command filled"
            ),
            Err(e) => warn!(
                kind   = ?cmd.kind,
                symbol = %cmd.symbol,
                reason = %e,
                "🚫 [LEDGER] Command rejected"
            ),
        }
        result
    }

    fn try_execute(&mut self, cmd: &TradeCommand, quotes: &impl Quotes) -> Result<Fill, LedgerError> {
        // ── 1. Quantity ───────────────────────────────────────────────────────
        if !(cmd.quantity.is_finite() && cmd.quantity > 0.0) {
            return Err(LedgerError::InvalidQuantity(cmd.quantity));
        }

        // ── 2. Liquidity ──────────────────────────────────────────────────────
        let price = quotes
            .price_of(&cmd.symbol)
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| LedgerError::NoLiquidity(cmd.symbol.clone()))?;

        // ── 3. Kind-specific ──────────────────────────────────────────────────
        match cmd.kind.opening_side() {
            Some(side) => self.open(cmd, side, price),
            None       => self.close(cmd, price),
        }
    }

    fn open(&mut self, cmd: &TradeCommand, side: Side, price: f64) -> Result<Fill, LedgerError> {
        let fill_price = match side {
            Side::Long  => price * self.slippage,
            Side::Short => price / self.slippage,
        };
        let cost = cmd.quantity * fill_price;

        if cost > self.cash {
            return Err(LedgerError::InsufficientFunds { required: cost, available: self.cash });
        }

        // ── Apply ─────────────────────────────────────────────────────────────
        self.cash -= cost;
        let remaining = match self
            .positions
            .iter_mut()
            .find(|p| p.symbol == cmd.symbol && p.side == side)
        {
            Some(existing) => {
                existing.add(cmd.quantity, fill_price);
                existing.size
            }
            None => {
                self.positions.push(Position::open(&cmd.symbol, side, cmd.quantity, fill_price));
                cmd.quantity
            }
        };

        Ok(self.record(cmd.kind, &cmd.symbol, side, cmd.quantity, fill_price, -cost, None, remaining))
    }

    fn close(&mut self, cmd: &TradeCommand, price: f64) -> Result<Fill, LedgerError> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.symbol == cmd.symbol && cmd.side.map_or(true, |s| s == p.side))
            .ok_or_else(|| LedgerError::NoPosition(cmd.symbol.clone()))?;

        let position   = &self.positions[idx];
        let side       = position.side;
        // ขาดไปแค่เศษ float ก็นับว่าปิดทั้งก้อน
        let exit_qty   = if cmd.quantity >= position.size * (1.0 - SIZE_DUST_RATIO) {
            position.size
        } else {
            cmd.quantity
        };
        let fill_price = match side {
            Side::Long  => price / self.slippage,
            Side::Short => price * self.slippage,
        };
        let pnl = position.pnl_at(fill_price, exit_qty);
        // both sides credit exit_qty × fill; a short's PnL shows in realized_pnl
        let proceeds     = exit_qty * fill_price;
        let fully_closed = exit_qty >= position.size;

        // ── Apply ─────────────────────────────────────────────────────────────
        self.cash         += proceeds;
        self.realized_pnl += pnl;
        let remaining = if fully_closed {
            self.positions.remove(idx);
            0.0
        } else {
            let position = &mut self.positions[idx];
            position.size -= exit_qty;
            position.size
        };

        Ok(self.record(CommandKind::Close, &cmd.symbol, side, exit_qty, fill_price, proceeds, Some(pnl), remaining))
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        kind:         CommandKind,
        symbol:       &str,
        side:         Side,
        quantity:     f64,
        price:        f64,
        cash_delta:   f64,
        realized_pnl: Option<f64>,
        remaining:    f64,
    ) -> Fill {
        let fill = Fill {
            trade_id: Uuid::new_v4(),
            kind,
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            cash_delta,
            realized_pnl,
            remaining,
            executed_at: Utc::now(),
        };
        self.fills.push(fill.clone());
        fill
    }

    // ─── Marking ──────────────────────────────────────────────────────────────

    /// Cash plus unrealized PnL of every open position at current prices.
    pub fn equity(&self, quotes: &impl Quotes) -> f64 {
        self.cash + self.positions.iter().map(|p| unrealized(p, quotes)).sum::<f64>()
    }

    pub fn view(&self, quotes: &impl Quotes) -> PortfolioView {
        let positions: Vec<PositionView> = self
            .positions
            .iter()
            .map(|p| PositionView {
                symbol:         p.symbol.clone(),
                side:           p.side,
                size:           p.size,
                entry_price:    p.entry_price,
                mark_price:     mark(p, quotes),
                unrealized_pnl: unrealized(p, quotes),
                opened_at:      p.opened_at,
            })
            .collect();
        let unrealized_pnl = positions.iter().map(|p| p.unrealized_pnl).sum::<f64>();

        PortfolioView {
            cash: self.cash,
            equity: self.cash + unrealized_pnl,
            realized_pnl: self.realized_pnl,
            unrealized_pnl,
            positions,
        }
    }
}

fn mark(position: &Position, quotes: &impl Quotes) -> Option<f64> {
    quotes.price_of(&position.symbol).filter(|p| p.is_finite() && *p > 0.0)
}

/// An unpriced instrument contributes nothing until it is priced again.
fn unrealized(position: &Position, quotes: &impl Quotes) -> f64 {
    mark(position, quotes).map_or(0.0, |m| position.unrealized_pnl(m))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn quotes(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    fn ledger() -> Ledger {
        Ledger::new(&LedgerConfig::default())
    }

    #[test]
    fn test_open_long_btc_example() {
        let mut ledger = ledger();
        let q = quotes(&[("BTCUSDT", 94_850.0)]);

        let fill = ledger.execute(&TradeCommand::open_long("BTCUSDT", 1.0), &q).unwrap();

        assert_eq!(ledger.cash(), 5_150.0);
        assert_eq!(fill.cash_delta, -94_850.0);
        assert_eq!(ledger.positions().len(), 1);
        let pos = &ledger.positions()[0];
        assert_eq!((pos.side, pos.size, pos.entry_price), (Side::Long, 1.0, 94_850.0));
    }

    #[test]
    fn test_close_long_btc_example() {
        let mut ledger = ledger();
        ledger.execute(&TradeCommand::open_long("BTCUSDT", 1.0), &quotes(&[("BTCUSDT", 94_850.0)])).unwrap();

        let fill = ledger
            .execute(&TradeCommand::close("BTCUSDT", 1.0), &quotes(&[("BTCUSDT", 95_850.0)]))
            .unwrap();

        assert_eq!(fill.realized_pnl, Some(1_000.0));
        assert_eq!(fill.remaining, 0.0);
        assert_eq!(ledger.cash(), 101_000.0);
        assert!(ledger.positions().is_empty());
        assert_eq!(ledger.realized_pnl(), 1_000.0);
    }

    #[test]
    fn test_average_entry_on_add() {
        let mut ledger = ledger();
        ledger.execute(&TradeCommand::open_long("TSLA", 10.0), &quotes(&[("TSLA", 100.0)])).unwrap();
        ledger.execute(&TradeCommand::open_long("TSLA", 10.0), &quotes(&[("TSLA", 200.0)])).unwrap();

        assert_eq!(ledger.positions().len(), 1);
        assert_eq!(ledger.positions()[0].size, 20.0);
        assert_eq!(ledger.positions()[0].entry_price, 150.0);
    }

    #[test]
    fn test_same_symbol_opposite_sides_are_separate() {
        let mut ledger = ledger();
        let q = quotes(&[("AAPL", 192.3)]);
        ledger.execute(&TradeCommand::open_long("AAPL", 1.0), &q).unwrap();
        ledger.execute(&TradeCommand::open_short("AAPL", 2.0), &q).unwrap();
        assert_eq!(ledger.positions().len(), 2);

        let mut close_short = TradeCommand::close("AAPL", 5.0);
        close_short.side = Some(Side::Short);
        let fill = ledger.execute(&close_short, &q).unwrap();
        assert_eq!(fill.side, Side::Short);
        assert_eq!(fill.quantity, 2.0);
        assert_eq!(ledger.positions().len(), 1);
        assert_eq!(ledger.positions()[0].side, Side::Long);
    }

    #[test]
    fn test_partial_close_keeps_entry() {
        let mut ledger = ledger();
        ledger.execute(&TradeCommand::open_long("NVDA", 10.0), &quotes(&[("NVDA", 100.0)])).unwrap();

        let fill = ledger.execute(&TradeCommand::close("NVDA", 4.0), &quotes(&[("NVDA", 110.0)])).unwrap();

        assert_eq!(fill.realized_pnl, Some(40.0));
        assert_eq!(fill.remaining, 6.0);
        assert_eq!(ledger.positions()[0].size, 6.0);
        assert_eq!(ledger.positions()[0].entry_price, 100.0);
    }

    #[test]
    fn test_close_clamps_to_position_size() {
        let mut ledger = ledger();
        let q = quotes(&[("NVDA", 100.0)]);
        ledger.execute(&TradeCommand::open_long("NVDA", 3.0), &q).unwrap();
        let fill = ledger.execute(&TradeCommand::close("NVDA", 50.0), &q).unwrap();
        assert_eq!(fill.quantity, 3.0);
        assert!(ledger.positions().is_empty());
        assert_eq!(ledger.cash(), 100_000.0);
    }

    #[test]
    fn test_full_close_after_fractional_adds_removes_position() {
        let mut ledger = ledger();
        let q = quotes(&[("TSLA", 100.0)]);
        ledger.execute(&TradeCommand::open_long("TSLA", 0.1), &q).unwrap();
        ledger.execute(&TradeCommand::open_long("TSLA", 0.2), &q).unwrap();
        assert_ne!(ledger.positions()[0].size, 0.3);

        let fill = ledger.execute(&TradeCommand::close("TSLA", 0.3), &q).unwrap();
        assert_eq!(fill.remaining, 0.0);
        assert!(ledger.positions().is_empty());
    }

    #[test]
    fn test_short_close_credits_exit_notional() {
        let mut ledger = ledger();
        ledger.execute(&TradeCommand::open_short("XAUUSD", 10.0), &quotes(&[("XAUUSD", 2_700.0)])).unwrap();
        assert_eq!(ledger.cash(), 73_000.0);

        let q = quotes(&[("XAUUSD", 2_650.0)]);
        assert_eq!(ledger.equity(&q), 73_500.0);

        let fill = ledger.execute(&TradeCommand::close("XAUUSD", 10.0), &q).unwrap();
        assert_eq!(fill.realized_pnl, Some(500.0));
        assert_eq!(fill.cash_delta, 26_500.0);
        assert_eq!(ledger.cash(), 99_500.0);
        assert_eq!(ledger.realized_pnl(), 500.0);
    }

    #[test]
    fn test_slippage_on_both_legs() {
        let mut ledger = Ledger::new(&LedgerConfig { starting_cash: 10_000.0, slippage: 1.0002 });
        let q = quotes(&[("EURUSD", 1.0)]);

        let open = ledger.execute(&TradeCommand::open_long("EURUSD", 1_000.0), &q).unwrap();
        assert!((open.price - 1.0002).abs() < 1e-12);

        let close = ledger.execute(&TradeCommand::close("EURUSD", 1_000.0), &q).unwrap();
        assert!((close.price - 1.0 / 1.0002).abs() < 1e-12);
        assert!(close.realized_pnl.unwrap() < 0.0);
        assert!(ledger.cash() < 10_000.0);
    }

    #[test]
    fn test_rejections_name_the_precondition() {
        let mut ledger = ledger();
        let q = quotes(&[("BTCUSDT", 94_850.0), ("BNBUSDT", 0.0)]);

        assert_eq!(
            ledger.execute(&TradeCommand::open_long("BTCUSDT", 0.0), &q),
            Err(LedgerError::InvalidQuantity(0.0))
        );
        assert!(matches!(
            ledger.execute(&TradeCommand::open_long("BTCUSDT", f64::NAN), &q),
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert_eq!(
            ledger.execute(&TradeCommand::open_long("BNBUSDT", 1.0), &q),
            Err(LedgerError::NoLiquidity("BNBUSDT".into()))
        );
        assert_eq!(
            ledger.execute(&TradeCommand::open_long("DOGEUSDT", 1.0), &q),
            Err(LedgerError::NoLiquidity("DOGEUSDT".into()))
        );
        assert_eq!(
            ledger.execute(&TradeCommand::open_long("BTCUSDT", 2.0), &q),
            Err(LedgerError::InsufficientFunds { required: 189_700.0, available: 100_000.0 })
        );
        assert_eq!(
            ledger.execute(&TradeCommand::close("BTCUSDT", 1.0), &q),
            Err(LedgerError::NoPosition("BTCUSDT".into()))
        );
    }

    #[test]
    fn test_rejection_leaves_ledger_untouched() {
        let mut ledger = ledger();
        let q = quotes(&[("BTCUSDT", 94_850.0), ("ETHUSDT", 2_450.15)]);
        ledger.execute(&TradeCommand::open_long("ETHUSDT", 3.0), &q).unwrap();
        let before = ledger.clone();

        assert!(ledger.execute(&TradeCommand::open_long("BTCUSDT", 5.0), &q).is_err());
        assert!(ledger.execute(&TradeCommand::close("SOLUSDT", 1.0), &q).is_err());
        assert!(ledger.execute(&TradeCommand::open_short("ETHUSDT", -1.0), &q).is_err());

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_conservation_over_random_sequence() {
        let mut rng    = ChaCha8Rng::seed_from_u64(2077);
        let mut ledger = Ledger::new(&LedgerConfig { starting_cash: 1_000_000.0, slippage: 1.0 });
        let symbols    = ["BTCUSDT", "TSLA", "EURUSD"];
        let mut prices = quotes(&[("BTCUSDT", 90_000.0), ("TSLA", 200.0), ("EURUSD", 1.1)]);

        let start_cash = ledger.cash();
        let mut costs    = 0.0;
        let mut proceeds = 0.0;

        for _ in 0..500 {
            for s in symbols {
                let p = prices[s] * (1.0 + rng.gen_range(-0.01..0.01));
                prices.insert(s.to_string(), p);
            }
            let symbol = symbols[rng.gen_range(0..symbols.len())];
            let qty    = rng.gen_range(0.1..5.0);
            let cmd = match rng.gen_range(0..3) {
                0 => TradeCommand::open_long(symbol, qty),
                1 => TradeCommand::open_short(symbol, qty),
                _ => TradeCommand::close(symbol, qty),
            };
            if let Ok(fill) = ledger.execute(&cmd, &prices) {
                if fill.cash_delta < 0.0 { costs += -fill.cash_delta } else { proceeds += fill.cash_delta }
                assert!(ledger.positions().iter().all(|p| p.size > 0.0));
            }

            let expected_equity = ledger.cash()
                + ledger.positions().iter().map(|p| (prices[&p.symbol] - p.entry_price) * p.size * p.side.sign()).sum::<f64>();
            assert!((ledger.equity(&prices) - expected_equity).abs() < 1e-6);
        }

        let expected_cash = start_cash - costs + proceeds;
        assert!((ledger.cash() - expected_cash).abs() < 1e-6 * start_cash);
    }

    #[test]
    fn test_view_uses_latest_prices() {
        let mut ledger = ledger();
        ledger.execute(&TradeCommand::open_long("SOLUSDT", 10.0), &quotes(&[("SOLUSDT", 145.0)])).unwrap();

        let view = ledger.view(&quotes(&[("SOLUSDT", 150.0)]));
        assert_eq!(view.unrealized_pnl, 50.0);
        assert_eq!(view.equity, ledger.cash() + 50.0);
        assert_eq!(view.positions[0].mark_price, Some(150.0));

        let unpriced = ledger.view(&quotes(&[]));
        assert_eq!(unpriced.positions[0].mark_price, None);
        assert_eq!(unpriced.equity, ledger.cash());
    }
}
