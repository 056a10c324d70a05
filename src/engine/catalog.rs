//! # engine::catalog
//!
//! The fixed instrument universe and the rule that decides which leg (live or
//! synthetic) prices each symbol.

use serde::{Deserialize, Serialize};

use crate::models::{AssetClass, Instrument};

/// Symbols ending with this suffix are priced by the live ticker stream.
pub const LIVE_SUFFIX: &str = "USDT";

// ─── FeedMode ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedMode {
    /// Crypto from the live exchange stream, everything else synthetic.
    Live,
    /// Every instrument synthetic. No network.
    Simulation,
}

impl std::str::FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live"       => Ok(FeedMode::Live),
            "simulation" => Ok(FeedMode::Simulation),
            other => Err(format!("unknown feed mode '{other}', use 'live' or 'simulation'")),
        }
    }
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub id:          &'static str,
    pub ticker:      &'static str,
    pub name:        &'static str,
    pub asset_class: AssetClass,
    /// `0.0` = no seed; the instrument is illiquid until its first live tick.
    pub seed_price:  f64,
    /// Starting price when the whole catalog is simulated.
    pub sim_seed:    f64,
    /// Random-walk volatility used whenever the instrument is ticked
    /// synthetically.
    pub volatility:  f64,
}

pub const CATALOG: &[CatalogEntry] = &[
    // ── Crypto (live leg) ─────────────────────────────────────────────────────
    CatalogEntry { id: "BTCUSDT", ticker: "BTCUSDT", name: "Bitcoin",  asset_class: AssetClass::Crypto, seed_price: 94_850.00, sim_seed: 94_850.00, volatility: 0.002 },
    CatalogEntry { id: "ETHUSDT", ticker: "ETHUSDT", name: "Ethereum", asset_class: AssetClass::Crypto, seed_price: 2_450.15,  sim_seed: 2_450.15, volatility: 0.003 },
    CatalogEntry { id: "SOLUSDT", ticker: "SOLUSDT", name: "Solana",   asset_class: AssetClass::Crypto, seed_price: 145.60,    sim_seed: 145.60, volatility: 0.005 },
    CatalogEntry { id: "BNBUSDT", ticker: "BNBUSDT", name: "BNB",      asset_class: AssetClass::Crypto, seed_price: 0.0,       sim_seed: 612.40, volatility: 0.003 },
    CatalogEntry { id: "XRPUSDT", ticker: "XRPUSDT", name: "XRP",      asset_class: AssetClass::Crypto, seed_price: 0.0,       sim_seed: 2.35, volatility: 0.004 },
    // ── Forex ─────────────────────────────────────────────────────────────────
    CatalogEntry { id: "EURUSD", ticker: "EUR/USD", name: "Euro / US Dollar",  asset_class: AssetClass::Forex, seed_price: 1.0825, sim_seed: 1.0825, volatility: 0.0001 },
    CatalogEntry { id: "GBPUSD", ticker: "GBP/USD", name: "Pound / US Dollar", asset_class: AssetClass::Forex, seed_price: 1.2640, sim_seed: 1.2640, volatility: 0.0001 },
    // ── Equities ──────────────────────────────────────────────────────────────
    CatalogEntry { id: "TSLA", ticker: "TSLA", name: "Tesla Inc.",  asset_class: AssetClass::Equity, seed_price: 218.50, sim_seed: 218.50, volatility: 0.50 },
    CatalogEntry { id: "NVDA", ticker: "NVDA", name: "NVIDIA Corp", asset_class: AssetClass::Equity, seed_price: 135.40, sim_seed: 135.40, volatility: 1.20 },
    CatalogEntry { id: "AAPL", ticker: "AAPL", name: "Apple Inc.",  asset_class: AssetClass::Equity, seed_price: 192.30, sim_seed: 192.30, volatility: 0.30 },
    // ── Commodities ───────────────────────────────────────────────────────────
    CatalogEntry { id: "XAUUSD", ticker: "GOLD", name: "Gold / US Dollar", asset_class: AssetClass::Commodity, seed_price: 2_742.80, sim_seed: 2_742.80, volatility: 0.80 },
];

impl CatalogEntry {
    /// Seed price under `mode`. Only simulation seeds the live-only coins.
    pub fn seed(&self, mode: FeedMode) -> f64 {
        match mode {
            FeedMode::Live       => self.seed_price,
            FeedMode::Simulation => self.sim_seed,
        }
    }
}

pub fn lookup(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.id == id)
}

/// Does `symbol` belong to the live leg under `mode`?
pub fn is_live_symbol(symbol: &str, mode: FeedMode) -> bool {
    mode == FeedMode::Live && symbol.ends_with(LIVE_SUFFIX)
}

/// Synthetic instruments ticked when `connect` gets no usable synthetic symbol.
pub fn default_synthetic(mode: FeedMode) -> Vec<String> {
    CATALOG
        .iter()
        .filter(|e| !is_live_symbol(e.id, mode) && e.seed(mode) > 0.0)
        .map(|e| e.id.to_string())
        .collect()
}

/// Every symbol the dashboard offers by default.
pub fn default_symbols() -> Vec<String> {
    CATALOG.iter().map(|e| e.id.to_string()).collect()
}

/// Build the instrument map from scratch. Called at start-up and on every
/// mode switch.
pub fn build_instruments(history_capacity: usize, mode: FeedMode) -> Vec<Instrument> {
    CATALOG
        .iter()
        .map(|e| Instrument::new(e.id, e.ticker, e.name, e.asset_class, e.seed(mode), history_capacity))
        .collect()
}
