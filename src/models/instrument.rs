//! # models::instrument
//!
//! Defines [`Instrument`] — สถานะตลาดของ Symbol หนึ่งตัว — and the
//! [`InstrumentUpdate`] partial that every feed tick produces.
//!
//! Updates are never applied in place: [`Instrument::merged`] returns a fresh
//! snapshot so a reader holding the previous one never sees a half-applied
//! tick.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize, Serializer};

// ─── AssetClass ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Crypto,
    Forex,
    Equity,
    Commodity,
    Index,
    Exotic,
    Other,
}

// ─── Trend ────────────────────────────────────────────────────────────────────

/// Qualitative direction derived from the sign of the 24h change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Trend::Bullish
        } else if change_pct < 0.0 {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }
}

// ─── PriceHistory ─────────────────────────────────────────────────────────────

/// Fixed-capacity FIFO of recent prices (oldest first).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    capacity: usize,
    prices:   VecDeque<f64>,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            prices:   VecDeque::with_capacity(capacity.max(1) + 1),
        }
    }

    /// History pre-filled with `capacity` copies of the seed price, so a
    /// freshly created instrument already has a flat line to draw.
    pub fn filled(capacity: usize, seed: f64) -> Self {
        let mut history = Self::new(capacity);
        for _ in 0..history.capacity {
            history.prices.push_back(seed);
        }
        history
    }

    pub fn push(&mut self, price: f64) {
        if self.prices.len() >= self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }
}

#[cfg(test)]
impl PriceHistory {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.back().copied()
    }
}

impl Serialize for PriceHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.prices.iter())
    }
}

// ─── Instrument ───────────────────────────────────────────────────────────────

/// One tradable symbol and its current market state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instrument {
    /// Immutable identifier, e.g. `"BTCUSDT"` or `"EURUSD"`.
    id: String,
    pub ticker:      String,
    pub name:        String,
    pub asset_class: AssetClass,
    /// Last price. `0.0` means the instrument has not been priced yet.
    pub price:       f64,
    pub history:     PriceHistory,
    pub change_24h:  f64,
    pub trend:       Trend,
    pub indicators:  Vec<String>,
}

impl Instrument {
    pub fn new(
        id: impl Into<String>,
        ticker: impl Into<String>,
        name: impl Into<String>,
        asset_class: AssetClass,
        seed_price: f64,
        history_capacity: usize,
    ) -> Self {
        let seed_price = sanitize_price(seed_price).unwrap_or(0.0);
        Self {
            id: id.into(),
            ticker: ticker.into(),
            name: name.into(),
            asset_class,
            price: seed_price,
            history: PriceHistory::filled(history_capacity, seed_price),
            change_24h: 0.0,
            trend: Trend::Neutral,
            indicators: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `true` once the instrument carries a usable (non-zero) price.
    pub fn is_priced(&self) -> bool {
        self.price > 0.0
    }

    /// Apply a partial update and return the resulting snapshot.
    ///
    /// An update addressed to another identifier is ignored. A non-finite or
    /// negative price is rejected field-wise, the rest of the update still
    /// applies.
    pub fn merged(&self, update: &InstrumentUpdate) -> Instrument {
        let mut next = self.clone();
        if update.id != self.id {
            return next;
        }

        if let Some(history) = &update.history {
            let mut rebuilt = PriceHistory::new(self.history.capacity());
            for &p in history {
                rebuilt.push(p);
            }
            next.history = rebuilt;
        }

        if let Some(price) = update.price.and_then(sanitize_price) {
            next.price = price;
            if update.history.is_none() {
                next.history.push(price);
            }
        }
        if let Some(change) = update.change_24h.filter(|c| c.is_finite()) {
            next.change_24h = change;
        }
        if let Some(trend) = update.trend {
            next.trend = trend;
        }
        if let Some(indicators) = &update.indicators {
            next.indicators = indicators.clone();
        }
        next
    }
}

fn sanitize_price(price: f64) -> Option<f64> {
    (price.is_finite() && price >= 0.0).then_some(price)
}

// ─── InstrumentUpdate ─────────────────────────────────────────────────────────

/// Only the fields that changed on a tick, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price:      Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend:      Option<Trend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
    /// Filled in by the aggregator after merging (the post-tick history).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history:    Option<Vec<f64>>,
}

#[cfg(test)]
impl InstrumentUpdate {
    pub fn price(id: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            price: Some(price),
            ..Self::default()
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
