//! # intelligence::parse — แปลง AI response เป็น struct
//!
//! Models wrap JSON in prose or code fences often enough that every
//! structured answer goes through [`clean_json`] before `serde_json`.

use serde::Deserialize;

use super::{Lesson, LessonStep, ProposalKind, ProviderError, TradeProposal};

/// Strip code fences and cut out the outermost JSON object or array,
/// whichever starts first.
pub fn clean_json(text: &str) -> String {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return "{}".to_string();
    }

    let object = cleaned.find('{').zip(cleaned.rfind('}'));
    let array  = cleaned.find('[').zip(cleaned.rfind(']'));

    let span = match (object, array) {
        (Some(o), Some(a)) => if o.0 < a.0 { Some(o) } else { Some(a) },
        (Some(o), None)    => Some(o),
        (None, Some(a))    => Some(a),
        (None, None)       => None,
    };

    match span {
        Some((start, end)) if start <= end => cleaned[start..=end].to_string(),
        _ => cleaned.to_string(),
    }
}

// ─── Trade proposal ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MentorJson {
    #[serde(default)]
    terminal_output: Option<String>,
    #[serde(default)]
    trade_action:    Option<TradeActionJson>,
}

#[derive(Debug, Deserialize)]
struct TradeActionJson {
    #[serde(rename = "type")]
    kind:   String,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    symbol: Option<String>,
}

/// Parse a mentor answer. `Ok(None)` when the mentor declines to trade.
/// A missing symbol falls back to `default_symbol`.
pub fn parse_proposal(text: &str, default_symbol: &str) -> Result<Option<TradeProposal>, ProviderError> {
    let cleaned = clean_json(text);
    let parsed: MentorJson = serde_json::from_str(&cleaned)
        .map_err(|e| ProviderError::Malformed(format!("{e}: {cleaned}")))?;

    let Some(action) = parsed.trade_action else {
        return Ok(None);
    };

    let kind = match action.kind.trim().to_uppercase().as_str() {
        "BUY"  => ProposalKind::Buy,
        "SELL" => ProposalKind::Sell,
        "CLOSE" => ProposalKind::Close,
        "NONE" | "" => return Ok(None),
        other => return Err(ProviderError::Malformed(format!("unknown trade action type '{other}'"))),
    };

    let quantity = action
        .amount
        .ok_or_else(|| ProviderError::Malformed("trade action without amount".to_string()))?;

    let symbol = action
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_symbol.to_string());

    Ok(Some(TradeProposal { kind, symbol, quantity, note: parsed.terminal_output }))
}

// ─── Lesson ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LessonJson {
    #[serde(default)]
    topic: Option<String>,
    steps: Vec<LessonStep>,
}

pub fn parse_lesson(text: &str, requested_topic: &str) -> Result<Lesson, ProviderError> {
    let cleaned = clean_json(text);
    let parsed: LessonJson = serde_json::from_str(&cleaned)
        .map_err(|e| ProviderError::Malformed(format!("{e}: {cleaned}")))?;

    if parsed.steps.is_empty() {
        return Err(ProviderError::Malformed("lesson has no steps".to_string()));
    }

    Ok(Lesson {
        topic: parsed
            .topic
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| requested_topic.to_string()),
        steps: parsed.steps,
    })
}
