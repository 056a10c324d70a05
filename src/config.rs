//! # config — อ่าน Config จาก Environment Variables
//!
//! | Variable                 | Default                            |
//! |--------------------------|------------------------------------|
//! | `BIND_ADDR`              | `0.0.0.0:3000`                     |
//! | `FEED_MODE`              | `live`                             |
//! | `LIVE_FEED_URL`          | `wss://stream.binance.com:9443/ws` |
//! | `TICK_INTERVAL_MS`       | `1000`                             |
//! | `HISTORY_CAPACITY`       | `20`                               |
//! | `ALERT_HISTORY_CAPACITY` | `20`                               |
//! | `ALERT_PROB_SYNTHETIC`   | `0.015`                            |
//! | `ALERT_PROB_LIVE`        | `0.005`                            |
//! | `PRICE_FLOOR_RATIO`      | `0.01`                             |
//! | `FEED_SEED`              | unset (entropy)                    |
//! | `STARTING_CASH`          | `100000`                           |
//! | `SLIPPAGE_MULTIPLIER`    | `1.0`                              |
//! | `AI_PROVIDER`            | `gemini`                           |
//! | `AI_API_KEY`             | unset (mentor offline)             |
//! | `AI_MODEL`               | per provider                       |
//! | `AI_BASE_URL`            | per provider                       |

use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{bail, Context};

use crate::{
    engine::{live::DEFAULT_LIVE_FEED_URL, FeedConfig, FeedMode, LedgerConfig},
    intelligence::{ProviderConfig, ProviderKind},
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr:     SocketAddr,
    pub live_feed_url: String,
    pub feed:          FeedConfig,
    pub ledger:        LedgerConfig,
    pub provider:      ProviderConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr: SocketAddr = parse_or(&get, "BIND_ADDR", "0.0.0.0:3000".parse()?)?;

        // ── Feed ──────────────────────────────────────────────────────────────
        let mode = match get("FEED_MODE") {
            Some(raw) => raw.parse::<FeedMode>().map_err(anyhow::Error::msg).context("FEED_MODE")?,
            None => FeedMode::Live,
        };
        let tick_ms: u64 = parse_or(&get, "TICK_INTERVAL_MS", 1_000)?;
        if tick_ms == 0 {
            bail!("TICK_INTERVAL_MS must be greater than 0");
        }
        let history_capacity: usize = parse_or(&get, "HISTORY_CAPACITY", 20)?;
        let alert_capacity: usize   = parse_or(&get, "ALERT_HISTORY_CAPACITY", 20)?;
        if history_capacity == 0 || alert_capacity == 0 {
            bail!("HISTORY_CAPACITY and ALERT_HISTORY_CAPACITY must be at least 1");
        }
        let alert_prob_synthetic = probability(&get, "ALERT_PROB_SYNTHETIC", 0.015)?;
        let alert_prob_live      = probability(&get, "ALERT_PROB_LIVE", 0.005)?;
        let price_floor_ratio: f64 = parse_or(&get, "PRICE_FLOOR_RATIO", 0.01)?;
        if !(0.0..1.0).contains(&price_floor_ratio) {
            bail!("PRICE_FLOOR_RATIO must be in [0, 1), got {price_floor_ratio}");
        }
        let seed = match get("FEED_SEED") {
            Some(raw) => Some(raw.parse::<u64>().context("FEED_SEED must be an unsigned integer")?),
            None => None,
        };

        // ── Ledger ────────────────────────────────────────────────────────────
        let starting_cash: f64 = parse_or(&get, "STARTING_CASH", 100_000.0)?;
        if !(starting_cash.is_finite() && starting_cash > 0.0) {
            bail!("STARTING_CASH must be a positive number, got {starting_cash}");
        }
        let slippage: f64 = parse_or(&get, "SLIPPAGE_MULTIPLIER", 1.0)?;
        if !(slippage.is_finite() && slippage >= 1.0) {
            bail!("SLIPPAGE_MULTIPLIER must be >= 1.0, got {slippage}");
        }

        // ── Intelligence Provider ─────────────────────────────────────────────
        let kind = match get("AI_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKind>().map_err(anyhow::Error::msg).context("AI_PROVIDER")?,
            None => ProviderKind::Gemini,
        };
        let mut provider = ProviderConfig::new(kind, get("AI_API_KEY"));
        if let Some(model) = get("AI_MODEL") {
            provider.model = model;
        }
        if let Some(base_url) = get("AI_BASE_URL") {
            provider.base_url = base_url;
        }

        Ok(Self {
            bind_addr,
            live_feed_url: get("LIVE_FEED_URL").unwrap_or_else(|| DEFAULT_LIVE_FEED_URL.to_string()),
            feed: FeedConfig {
                mode,
                tick_interval: Duration::from_millis(tick_ms),
                history_capacity,
                alert_capacity,
                alert_prob_synthetic,
                alert_prob_live,
                price_floor_ratio,
                seed,
            },
            ledger: LedgerConfig { starting_cash, slippage },
            provider,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

fn probability<G>(get: &G, key: &str, default: f64) -> anyhow::Result<f64>
where
    G: Fn(&str) -> Option<String>,
{
    let p: f64 = parse_or(get, key, default)?;
    if !(0.0..=1.0).contains(&p) {
        bail!("{key} must be a probability in [0, 1], got {p}");
    }
    Ok(p)
}
