//! # engine::live
//!
//! The live leg's transport. [`LiveConnector`] opens one stream of raw text
//! frames for a symbol set; the aggregator owns the stream and drops it to
//! close the socket.
//!
//! ```text
//! BinanceConnector::open(["BTCUSDT","ETHUSDT"])
//!   → wss://stream.binance.com:9443/ws/btcusdt@ticker/ethusdt@ticker
//!   → Stream<Item = Result<String, FeedError>>
//! ```

use async_trait::async_trait;
use futures_util::{stream::BoxStream, StreamExt};
use thiserror::Error;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::info;

pub const DEFAULT_LIVE_FEED_URL: &str = "wss://stream.binance.com:9443/ws";

/// Transport failures of the live leg. Never fatal to the synthetic leg.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("live stream closed: {0}")]
    Closed(String),

    #[error("no live symbols to subscribe")]
    NoSymbols,
}

/// Raw text frames of one live session.
pub type FrameStream = BoxStream<'static, Result<String, FeedError>>;

#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open one connection covering every symbol in `symbols`.
    async fn open(&self, symbols: &[String]) -> Result<FrameStream, FeedError>;
}

// ─── Binance ──────────────────────────────────────────────────────────────────

/// Binance combined `<symbol>@ticker` stream.
#[derive(Debug, Clone)]
pub struct BinanceConnector {
    base_url: String,
}

impl BinanceConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn stream_url(&self, symbols: &[String]) -> String {
        let streams: Vec<String> = symbols
            .iter()
            .map(|s| format!("{}@ticker", s.to_lowercase()))
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), streams.join("/"))
    }
}

impl Default for BinanceConnector {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_FEED_URL)
    }
}

#[async_trait]
impl LiveConnector for BinanceConnector {
    async fn open(&self, symbols: &[String]) -> Result<FrameStream, FeedError> {
        if symbols.is_empty() {
            return Err(FeedError::NoSymbols);
        }

        let url = self.stream_url(symbols);
        let (ws, _response) = connect_async(url.as_str()).await?;
        info!(url = %url, symbols = symbols.len(), "🔌 [LIVE] Connected to ticker stream");

        // Ping/Pong/Binary carry no prices.
        let frames = ws
            .filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(Message::Close(frame)) => Some(Err(FeedError::Closed(
                        frame
                            .map(|f| f.reason.to_string())
                            .unwrap_or_else(|| "server closed the stream".to_string()),
                    ))),
                    Ok(_) => None,
                    Err(e) => Some(Err(FeedError::WebSocket(e))),
                }
            })
            .boxed();

        Ok(frames)
    }
}
