//! # intelligence
//!
//! The AI mentor boundary. Everything the LLM says is untrusted text:
//!
//! ```text
//! ask_for_commentary(situation) → String        (fallback on failure)
//! propose_trade(context)        → TradeProposal → TradeCommand → Ledger::execute
//! generate_lesson(topic)        → Lesson        → LessonCursor (step by step)
//! ```
//!
//! Rate-limit / unavailable signals are retried inside the provider
//! ([`retry::with_retry`]); anything else fails the call at once.

pub mod client;
pub mod lesson;
pub mod parse;
pub mod prompt;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::TradeCommand;

pub use client::{HttpProvider, ProviderConfig, ProviderKind};
pub use lesson::{LessonCursor, LessonProgress};

/// Shown instead of commentary when the provider gives up.
pub const COMMENTARY_FALLBACK: &str =
    "[MENTOR OFFLINE] Uplink cooling down. No commentary for this trade.";

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 429 or a quota / RESOURCE_EXHAUSTED body.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// HTTP 502 / 503 / 529.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// No API key configured. Returned without any network I/O.
    #[error("intelligence provider not configured (AI_API_KEY missing)")]
    NotConfigured,

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl ProviderError {
    /// Only throttling and temporary outages are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_) | ProviderError::Unavailable(_))
    }
}

// ─── Boundary types ───────────────────────────────────────────────────────────

/// What the mentor sees when asked to act on a practice command.
#[derive(Debug, Clone, Serialize)]
pub struct TradeContext {
    pub command:  String,
    pub strategy: Option<String>,
    pub symbol:   String,
    pub ticker:   String,
    pub price:    f64,
    pub equity:   f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalKind {
    Buy,
    Sell,
    Close,
    None,
}

/// A trade suggested by the provider. Converted to a [`TradeCommand`] and
/// validated by the ledger like any manual command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeProposal {
    pub kind:     ProposalKind,
    pub symbol:   String,
    pub quantity: f64,
    /// Free-text terminal reply that came with the proposal.
    pub note:     Option<String>,
}

impl TradeProposal {
    /// `None` for a NONE proposal.
    pub fn to_command(&self) -> Option<TradeCommand> {
        match self.kind {
            ProposalKind::Buy   => Some(TradeCommand::open_long(&self.symbol, self.quantity)),
            ProposalKind::Sell  => Some(TradeCommand::open_short(&self.symbol, self.quantity)),
            ProposalKind::Close => Some(TradeCommand::close(&self.symbol, self.quantity)),
            ProposalKind::None  => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonStep {
    #[serde(alias = "boardNotes")]
    pub display_notes:  String,
    #[serde(alias = "speechText")]
    pub narration_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub topic: String,
    pub steps: Vec<LessonStep>,
}

// ─── Provider trait ───────────────────────────────────────────────────────────

#[async_trait]
pub trait IntelligenceProvider: Send + Sync {
    /// Short label for logs and the health endpoint.
    fn name(&self) -> String;

    async fn ask_for_commentary(&self, situation: &str) -> Result<String, ProviderError>;

    /// `Ok(None)` = the provider chose not to trade.
    async fn propose_trade(&self, context: &TradeContext) -> Result<Option<TradeProposal>, ProviderError>;

    async fn generate_lesson(&self, topic: &str) -> Result<Lesson, ProviderError>;
}

// ─── Mentor (fallback policy) ─────────────────────────────────────────────────

/// Commentary text plus whether it is the offline fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commentary {
    pub text:     String,
    pub fallback: bool,
}

/// Commentary never fails: a provider error degrades to
/// [`COMMENTARY_FALLBACK`].
pub async fn commentary_or_fallback(provider: &dyn IntelligenceProvider, situation: &str) -> Commentary {
    match provider.ask_for_commentary(situation).await {
        Ok(text) => Commentary { text, fallback: false },
        Err(e) => {
            warn!(provider = %provider.name(), error = %e, "🧠 [MENTOR] Commentary failed, using fallback");
            Commentary { text: COMMENTARY_FALLBACK.to_string(), fallback: true }
        }
    }
}
