//! # engine::generator
//!
//! **Price Generator** — ราคาถัดไปของทุก Instrument ในแต่ละ Tick
//!
//! ## Two sources
//! ```text
//! Live      → parse_ticker()     Binance 24hrTicker frame → InstrumentUpdate
//! Synthetic → synthetic_update() price × (1 + shock), shock ∈ [-vol/2, +vol/2]
//! ```
//!
//! Both return the same partial-update shape so the aggregator never needs to
//! know where a price came from.

use rand::Rng;
use serde::Deserialize;

use crate::models::{InstrumentUpdate, Trend};

/// Above this absolute 24h change a live instrument is flagged volatile.
const HIGH_VOLATILITY_PCT: f64 = 5.0;
/// Price within 2% of the 24h high counts as "near highs".
const NEAR_HIGH_RATIO: f64 = 0.98;

pub const SYNTHETIC_INDICATOR: &str = "Synthetic Real-Time";

// ─── Live Ticker ──────────────────────────────────────────────────────────────

/// Binance `<symbol>@ticker` payload (only the fields we read).
/// Binance ส่งตัวเลขมาเป็น String ทั้งหมด
#[derive(Debug, Deserialize)]
struct TickerEvent {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    last_price: String,
    #[serde(rename = "P")]
    change_pct: String,
    #[serde(rename = "h", default)]
    high: Option<String>,
}

/// Raw stream frames arrive bare; combined-stream frames wrap them in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TickerFrame {
    Combined { data: TickerEvent },
    Raw(TickerEvent),
}

/// Parse one live message into an update.
///
/// Returns `None` for anything unusable (bad JSON, missing fields, a
/// different event type, unparsable or negative numbers). The caller drops
/// the frame.
pub fn parse_ticker(text: &str) -> Option<InstrumentUpdate> {
    let event = match serde_json::from_str::<TickerFrame>(text).ok()? {
        TickerFrame::Combined { data } => data,
        TickerFrame::Raw(event) => event,
    };

    if event.event_type != "24hrTicker" {
        return None;
    }

    let price: f64  = parse_number(&event.last_price)?;
    let change: f64 = event.change_pct.trim().parse().ok().filter(|c: &f64| c.is_finite())?;
    if price < 0.0 {
        return None;
    }

    let mut indicators = vec![if change.abs() > HIGH_VOLATILITY_PCT {
        "High Volatility".to_string()
    } else {
        "Stable".to_string()
    }];
    if let Some(high) = event.high.as_deref().and_then(parse_number) {
        indicators.push(if price > high * NEAR_HIGH_RATIO {
            "Near Highs".to_string()
        } else {
            "Retracing".to_string()
        });
    }

    Some(InstrumentUpdate {
        id:         event.symbol.to_uppercase(),
        price:      Some(price),
        change_24h: Some(change),
        trend:      Some(Trend::from_change(change)),
        indicators: Some(indicators),
        history:    None,
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ─── Synthetic Random Walk ────────────────────────────────────────────────────

/// One multiplicative random-walk step: `price × (1 + shock)`.
pub fn synthetic_step<R: Rng + ?Sized>(price: f64, volatility: f64, rng: &mut R) -> f64 {
    let half = volatility.abs() / 2.0;
    let shock = rng.gen_range(-half..=half);
    price * (1.0 + shock)
}

/// Next synthetic update for an instrument currently at `price`.
///
/// `floor_ratio` keeps the walk from collapsing: the price never goes below
/// `seed_price × floor_ratio`. The 24h change is measured against the seed and
/// rounded to two decimals.
pub fn synthetic_update<R: Rng + ?Sized>(
    id:          &str,
    price:       f64,
    seed_price:  f64,
    volatility:  f64,
    floor_ratio: f64,
    rng:         &mut R,
) -> InstrumentUpdate {
    let floor = seed_price * floor_ratio.max(0.0);
    let next  = synthetic_step(price, volatility, rng).max(floor).max(0.0);

    let change = if seed_price > 0.0 {
        round2((next - seed_price) / seed_price * 100.0)
    } else {
        0.0
    };

    InstrumentUpdate {
        id:         id.to_string(),
        price:      Some(next),
        change_24h: Some(change),
        trend:      Some(Trend::from_change(change)),
        indicators: Some(vec![SYNTHETIC_INDICATOR.to_string()]),
        history:    None,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ─── Tests ────────────────────────────────────────────────────────────────────
