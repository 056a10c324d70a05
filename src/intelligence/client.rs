//! # intelligence::client — เรียก Claude / OpenAI / Gemini API
//!
//! One [`HttpProvider`] speaks whichever backend `AI_PROVIDER` selects. Every
//! backend is reduced to "system + prompt in, text out"; the trait methods
//! add retry and parsing on top.
//!
//! ## HTTP status → ProviderError
//! ```text
//! 429, or body mentions quota / RESOURCE_EXHAUSTED → RateLimited   (retry)
//! 502 / 503 / 529                                   → Unavailable   (retry)
//! anything else non-2xx                             → Api           (fail)
//! ```

use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    parse::{parse_lesson, parse_proposal},
    prompt::{lesson_prompt, lesson_system, trade_prompt, MENTOR_SYSTEM, STRUCTURED_SYSTEM},
    retry::{with_retry, RetryPolicy},
    IntelligenceProvider, Lesson, ProviderError, TradeContext, TradeProposal,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1_024;

// ─── Provider selection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude-3-5-sonnet-20241022",
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Claude => "https://api.anthropic.com",
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Claude => write!(f, "Claude"),
            ProviderKind::OpenAi => write!(f, "OpenAI"),
            ProviderKind::Gemini => write!(f, "Gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "openai"               => Ok(ProviderKind::OpenAi),
            "gemini" | "google"    => Ok(ProviderKind::Gemini),
            other => Err(format!("unknown AI_PROVIDER '{other}', use 'claude', 'openai' or 'gemini'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind:             ProviderKind,
    /// `None` disables every call (no network I/O).
    pub api_key:          Option<String>,
    pub model:            String,
    pub base_url:         String,
    pub timeout:          Duration,
    pub commentary_retry: RetryPolicy,
    pub structured_retry: RetryPolicy,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            kind,
            api_key,
            model:            kind.default_model().to_string(),
            base_url:         kind.default_base_url().to_string(),
            timeout:          Duration::from_secs(30),
            commentary_retry: RetryPolicy::commentary(),
            structured_retry: RetryPolicy::structured(),
        }
    }
}

// ─── Wire types: Anthropic Claude ─────────────────────────────────────────────

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model:      &'a str,
    max_tokens: u32,
    system:     &'a str,
    messages:   Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

// ─── Wire types: OpenAI ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role:    &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model:    &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiFormat>,
}

#[derive(Serialize)]
struct OpenAiFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMsg,
}

#[derive(Deserialize)]
struct OpenAiChoiceMsg {
    content: Option<String>,
}

// ─── Wire types: Google Gemini ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents:           Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config:  Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

// ─── HttpProvider ─────────────────────────────────────────────────────────────

pub struct HttpProvider {
    http:   reqwest::Client,
    config: ProviderConfig,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// One raw call: system + prompt in, model text out. No retry here.
    async fn complete(&self, system: &str, prompt: &str, json: bool) -> Result<String, ProviderError> {
        let api_key = self.api_key().ok_or(ProviderError::NotConfigured)?;
        let base    = self.config.base_url.trim_end_matches('/');
        let model   = self.config.model.as_str();

        debug!(provider = %self.config.kind, model, json, "🧠 [AI] Calling provider");

        let request = match self.config.kind {
            ProviderKind::Claude => self
                .http
                .post(format!("{base}/v1/messages"))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&ClaudeRequest {
                    model,
                    max_tokens: MAX_TOKENS,
                    system,
                    messages: vec![ChatMessage { role: "user", content: prompt }],
                }),
            ProviderKind::OpenAi => self
                .http
                .post(format!("{base}/v1/chat/completions"))
                .bearer_auth(api_key)
                .json(&OpenAiRequest {
                    model,
                    messages: vec![
                        ChatMessage { role: "system", content: system },
                        ChatMessage { role: "user",   content: prompt },
                    ],
                    response_format: json.then_some(OpenAiFormat { kind: "json_object" }),
                }),
            ProviderKind::Gemini => self
                .http
                .post(format!("{base}/v1beta/models/{model}:generateContent"))
                .header("x-goog-api-key", api_key)
                .json(&GeminiRequest {
                    system_instruction: GeminiContent { parts: vec![GeminiPart { text: system }] },
                    contents:           vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
                    generation_config:  json.then_some(GeminiGenerationConfig { response_mime_type: "application/json" }),
                }),
        };

        let resp = request
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify(status.as_u16(), body));
        }

        let text = match self.config.kind {
            ProviderKind::Claude => resp
                .json::<ClaudeResponse>()
                .await
                .map_err(malformed)?
                .content
                .into_iter()
                .find_map(|c| c.text),
            ProviderKind::OpenAi => resp
                .json::<OpenAiResponse>()
                .await
                .map_err(malformed)?
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
            ProviderKind::Gemini => resp
                .json::<GeminiResponse>()
                .await
                .map_err(malformed)?
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text)),
        };

        text.filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProviderError::Malformed(format!("{} returned empty content", self.config.kind)))
    }
}

fn classify(status: u16, body: String) -> ProviderError {
    let lower = body.to_lowercase();
    match status {
        429 => ProviderError::RateLimited(body),
        502 | 503 | 529 => ProviderError::Unavailable(format!("HTTP {status}")),
        _ if lower.contains("resource_exhausted") || lower.contains("quota") => ProviderError::RateLimited(body),
        _ => ProviderError::Api { status, body },
    }
}

fn malformed(e: reqwest::Error) -> ProviderError {
    ProviderError::Malformed(e.to_string())
}

#[async_trait]
impl IntelligenceProvider for HttpProvider {
    fn name(&self) -> String {
        format!("{} ({})", self.config.kind, self.config.model)
    }

    async fn ask_for_commentary(&self, situation: &str) -> Result<String, ProviderError> {
        let text = with_retry(&self.config.commentary_retry, "commentary", || {
            self.complete(MENTOR_SYSTEM, situation, false)
        })
        .await?;
        Ok(text.trim().to_string())
    }

    async fn propose_trade(&self, context: &TradeContext) -> Result<Option<TradeProposal>, ProviderError> {
        let prompt = trade_prompt(context);
        let text = with_retry(&self.config.structured_retry, "propose_trade", || {
            self.complete(STRUCTURED_SYSTEM, &prompt, true)
        })
        .await?;
        parse_proposal(&text, &context.symbol)
    }

    async fn generate_lesson(&self, topic: &str) -> Result<Lesson, ProviderError> {
        let system = lesson_system(topic);
        let prompt = lesson_prompt(topic);
        let text = with_retry(&self.config.structured_retry, "generate_lesson", || {
            self.complete(&system, &prompt, true)
        })
        .await?;
        parse_lesson(&text, topic)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::ProposalKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instant_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay:  Duration::ZERO,
            jitter:     Duration::ZERO,
            budget:     Duration::from_secs(60),
        }
    }

    fn provider(kind: ProviderKind, server: &MockServer) -> HttpProvider {
        HttpProvider::new(ProviderConfig {
            base_url:         server.uri(),
            commentary_retry: instant_retry(8),
            structured_retry: instant_retry(3),
            ..ProviderConfig::new(kind, Some("test-key".into()))
        })
    }

    fn context() -> TradeContext {
        TradeContext {
            command:  "long bitcoin, small size".into(),
            strategy: Some("Momentum Trading Dynamics".into()),
            symbol:   "BTCUSDT".into(),
            ticker:   "BTCUSDT".into(),
            price:    94_850.0,
            equity:   100_000.0,
        }
    }

    #[tokio::test]
    async fn test_claude_commentary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "  Clean entry, watch the stop.  " }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(ProviderKind::Claude, &server).ask_for_commentary("opened 1 BTC").await.unwrap();
        assert_eq!(text, "Clean entry, watch the stop.");
    }

    #[tokio::test]
    async fn test_openai_proposal_through_fences() {
        let server = MockServer::start().await;
        let content = "```json\n{\"terminalOutput\":\"Going long.\",\"tradeAction\":{\"type\":\"BUY\",\"amount\":0.1,\"symbol\":\"BTCUSDT\"}}\n```";
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            })))
            .mount(&server)
            .await;

        let proposal = provider(ProviderKind::OpenAi, &server)
            .propose_trade(&context())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(proposal.kind, ProposalKind::Buy);
        assert_eq!(proposal.quantity, 0.1);
        assert_eq!(proposal.note.as_deref(), Some("Going long."));
    }

    #[tokio::test]
    async fn test_gemini_lesson() {
        let server = MockServer::start().await;
        let lesson = json!({
            "topic": "Wyckoff Accumulation/Distribution",
            "steps": [
                { "boardNotes": "## Origins", "speechText": "Richard Wyckoff..." },
                { "boardNotes": "## Phases",  "speechText": "Phase A..." },
                { "boardNotes": "## Traps",   "speechText": "Beware the spring..." }
            ]
        });
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": lesson.to_string() }] } }]
            })))
            .mount(&server)
            .await;

        let lesson = provider(ProviderKind::Gemini, &server)
            .generate_lesson("Wyckoff Accumulation/Distribution")
            .await
            .unwrap();
        assert_eq!(lesson.steps.len(), 3);
        assert_eq!(lesson.steps[2].narration_text, "Beware the spring...");
    }

    #[tokio::test]
    async fn test_rate_limit_retried_up_to_policy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(3)
            .mount(&server)
            .await;

        let result = provider(ProviderKind::Gemini, &server).generate_lesson("MACD").await;
        assert!(matches!(result, Err(ProviderError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_unavailable_then_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "Back online." }]
            })))
            .mount(&server)
            .await;

        let text = provider(ProviderKind::Claude, &server).ask_for_commentary("hello").await.unwrap();
        assert_eq!(text, "Back online.");
    }

    #[tokio::test]
    async fn test_quota_body_counts_as_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#))
            .expect(3)
            .mount(&server)
            .await;

        let result = provider(ProviderKind::Gemini, &server).propose_trade(&context()).await;
        assert!(matches!(result, Err(ProviderError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(ProviderKind::OpenAi, &server).ask_for_commentary("x").await;
        assert!(matches!(result, Err(ProviderError::Api { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_missing_key_never_touches_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = HttpProvider::new(ProviderConfig {
            base_url: server.uri(),
            ..ProviderConfig::new(ProviderKind::Claude, None)
        });
        assert!(!provider.is_configured());
        assert!(matches!(provider.ask_for_commentary("x").await, Err(ProviderError::NotConfigured)));
        assert!(matches!(provider.generate_lesson("x").await, Err(ProviderError::NotConfigured)));
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("anthropic".parse::<ProviderKind>(), Ok(ProviderKind::Claude));
        assert!("llama".parse::<ProviderKind>().is_err());
    }
}
