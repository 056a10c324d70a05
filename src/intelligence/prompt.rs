//! # intelligence::prompt — สร้าง Prompt สำหรับ Mentor
//!
//! Structured calls (proposal, lesson) force a JSON-only answer; the parser
//! in [`super::parse`] still cleans whatever comes back.

use crate::models::{Fill, Side};

use super::TradeContext;

pub const MENTOR_SYSTEM: &str = "You are the TradeSim Alpha AI, a sophisticated trading mentor. \
Your tone is professional and futuristic (2077 aesthetic). You coach a student trading a simulated account.";

pub const STRUCTURED_SYSTEM: &str = "You are the TradeSim Alpha execution mentor. Always respond with valid JSON only.";

pub fn lesson_system(topic: &str) -> String {
    format!(
        "You represent the Apex Capital Academy. Current topic focus: {topic}. \
         Provide institutional-grade logic in a futuristic tone."
    )
}

/// Prompt that turns a free-text practice command into a trade proposal.
pub fn trade_prompt(ctx: &TradeContext) -> String {
    let strategy = ctx.strategy.as_deref().unwrap_or("Discretionary");
    format!(r#"COMMAND: "{command}"
STRATEGY: {strategy}
ASSET: {ticker} ({symbol}) @ ${price}
ACCOUNT EQUITY: ${equity:.2}

Evaluate the command as a trading mentor. If it asks for a trade, size it
sensibly for the account. Respond with ONLY this JSON object:
{{
  "terminalOutput": "<one-line reply to the student>",
  "tradeAction": {{ "type": "BUY" | "SELL" | "CLOSE" | "NONE", "amount": <float>, "symbol": "{symbol}" }}
}}"#,
        command = ctx.command,
        ticker  = ctx.ticker,
        symbol  = ctx.symbol,
        price   = ctx.price,
        equity  = ctx.equity,
    )
}

pub fn lesson_prompt(topic: &str) -> String {
    format!(r#"The student wants to study: "{topic}".
Provide a 3-step lecture module.

Step 1: Foundational logic and history.
Step 2: Core execution mechanics and rules.
Step 3: Advanced optimization and common pitfalls.

Respond with ONLY this JSON object:
{{
  "topic": "{topic}",
  "steps": [
    {{ "boardNotes": "<markdown notes>", "speechText": "<narration for the instructor>" }}
  ]
}}"#)
}

/// One-paragraph description of a fill for post-trade commentary.
pub fn fill_situation(fill: &Fill, cash_after: f64) -> String {
    let action = match (fill.realized_pnl, fill.side) {
        (Some(_), _)      => "closed",
        (None, Side::Long)  => "went LONG",
        (None, Side::Short) => "went SHORT",
    };
    let pnl = fill
        .realized_pnl
        .map(|p| format!(" Realized PnL: {p:+.2}."))
        .unwrap_or_default();

    format!(
        "The student {action} {qty} {symbol} at ${price:.4}.{pnl} Cash is now ${cash_after:.2}. \
         Give a short critique of this trade in two sentences.",
        qty    = fill.quantity,
        symbol = fill.symbol,
        price  = fill.price,
    )
}
