//! # models::alert
//!
//! Large-trade ("whale") notifications synthesized by the feed.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id:        Uuid,
    pub symbol:    String,
    pub side:      AlertSide,
    /// Notional size in quote currency.
    pub size:      f64,
    pub timestamp: DateTime<Utc>,
}

/// Bounded buffer of recent alerts, oldest evicted first.
#[derive(Debug, Clone)]
pub struct AlertLog {
    capacity: usize,
    alerts:   VecDeque<Alert>,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            alerts:   VecDeque::with_capacity(capacity.max(1) + 1),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        if self.alerts.len() >= self.capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_log_is_bounded() {
        let mut log = AlertLog::new(2);
        for symbol in ["A", "B", "C"] {
            log.push(Alert {
                id:        Uuid::new_v4(),
                symbol:    symbol.into(),
                side:      AlertSide::Buy,
                size:      100_000.0,
                timestamp: Utc::now(),
            });
        }
        let symbols: Vec<_> = log.snapshot().into_iter().map(|a| a.symbol).collect();
        assert_eq!(symbols, vec!["B", "C"]);
    }
}
