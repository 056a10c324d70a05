//! # routes::mentor
//!
//! AI mentor endpoints: practice commands, free commentary and the lesson
//! session.
//!
//! ```text
//! POST /api/mentor/command
//!   └─► propose_trade(context) ──► TradeProposal? ──► state.execute(Mentor)
//!                                                    └─► spawn_commentary()
//! ```

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::AppError,
    events::{TradeSource, WsEvent},
    intelligence::{self, LessonCursor, LessonProgress, TradeContext},
    state::SharedState,
};

#[derive(Debug, Deserialize)]
pub struct MentorCommandRequest {
    /// Free-text practice command, e.g. "buy 0.5 on the breakout".
    pub command:  String,
    /// Instrument the student is looking at.
    pub symbol:   String,
    #[serde(default)]
    pub strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentaryRequest {
    pub situation: String,
}

#[derive(Debug, Deserialize)]
pub struct LessonRequest {
    pub topic: String,
}

// ─── Practice Command ─────────────────────────────────────────────────────────

/// POST /api/mentor/command
pub async fn mentor_command(
    State(state): State<SharedState>,
    Json(request): Json<MentorCommandRequest>,
) -> Result<impl IntoResponse, AppError> {
    let command = request.command.trim();
    if command.is_empty() {
        return Err(AppError::BadRequest("command is required".into()));
    }

    let symbol = request.symbol.trim().to_uppercase();
    let instrument = state
        .feed
        .instrument(&symbol)
        .await
        .ok_or_else(|| AppError::NotFound(format!("instrument {symbol}")))?;

    let context = TradeContext {
        command:  command.to_string(),
        strategy: request.strategy.clone(),
        symbol:   instrument.id().to_string(),
        ticker:   instrument.ticker.clone(),
        price:    instrument.price,
        equity:   state.portfolio().await.equity,
    };

    let Some(proposal) = state.mentor.propose_trade(&context).await? else {
        info!(symbol = %symbol, "🧠 [MENTOR] No trade proposed");
        return Ok(Json(json!({ "ok": true, "proposal": null, "fill": null })));
    };

    let Some(trade) = proposal.to_command() else {
        return Ok(Json(json!({ "ok": true, "proposal": proposal, "fill": null })));
    };

    let executed = state.execute(&trade, TradeSource::Mentor).await.map_err(|e| {
        warn!(symbol = %trade.symbol, reason = %e, "🚫 [MENTOR] Proposal rejected by ledger");
        AppError::from(e)
    })?;
    info!(
        trade_id = %executed.fill.trade_id,
        symbol   = %executed.fill.symbol,
        "🧠 [MENTOR] Proposal executed"
    );
    state.spawn_commentary(executed.fill.clone(), executed.cash);

    Ok(Json(json!({
        "ok":       true,
        "proposal": proposal,
        "fill":     executed.fill,
        "cash":     executed.cash,
    })))
}

// ─── Commentary ───────────────────────────────────────────────────────────────

/// POST /api/mentor/commentary — never fails, degrades to the offline text
pub async fn commentary(
    State(state): State<SharedState>,
    Json(request): Json<CommentaryRequest>,
) -> impl IntoResponse {
    let commentary = intelligence::commentary_or_fallback(state.mentor.as_ref(), &request.situation).await;
    state.broadcast(&WsEvent::Commentary {
        trade_id: None,
        text:     commentary.text.clone(),
        fallback: commentary.fallback,
    });

    Json(json!({ "ok": true, "text": commentary.text, "fallback": commentary.fallback }))
}

// ─── Lesson Session ───────────────────────────────────────────────────────────

/// POST /api/mentor/lesson — generate a lesson and replace any running one
pub async fn start_lesson(
    State(state): State<SharedState>,
    Json(request): Json<LessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AppError::BadRequest("topic is required".into()));
    }

    let lesson = state.mentor.generate_lesson(topic).await?;
    let cursor = LessonCursor::new(lesson);
    let progress = cursor.current();
    info!(topic = %cursor.topic(), "📚 [LESSON] Started");

    *state.lesson.lock().await = Some(cursor);
    announce(&state, &progress);

    Ok(Json(json!({ "ok": true, "progress": progress })))
}

/// GET /api/mentor/lesson
pub async fn current_lesson(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let progress = state
        .lesson
        .lock()
        .await
        .as_ref()
        .map(LessonCursor::current)
        .ok_or_else(|| AppError::NotFound("no active lesson".into()))?;

    Ok(Json(json!({ "ok": true, "progress": progress })))
}

/// POST /api/mentor/lesson/next
pub async fn next_lesson_step(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let progress = {
        let mut session = state.lesson.lock().await;
        let cursor = session
            .as_mut()
            .ok_or_else(|| AppError::NotFound("no active lesson".into()))?;
        let progress = cursor.advance();
        if cursor.is_complete() {
            // จบ module แล้ว ปลดล็อก practice
            *session = None;
        }
        progress
    };
    announce(&state, &progress);

    Ok(Json(json!({ "ok": true, "progress": progress })))
}

fn announce(state: &SharedState, progress: &LessonProgress) {
    match progress {
        LessonProgress::Complete { topic } => {
            info!(topic = %topic, "🎓 [LESSON] Module complete");
            state.broadcast(&WsEvent::ModuleComplete { topic: topic.clone() });
        }
        LessonProgress::Step { .. } => state.broadcast(&WsEvent::LessonStep { progress: progress.clone() }),
    }
}
