//! AI-written headlines layered on top of the template narrative.
//!
//! Everything here is best effort: a slow, failing, or rate-limited writer
//! yields `None` and the caller keeps the template headlines.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use contracts::{BudgetAction, BudgetState, NarrativeEvent, NarrativeKind};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum gap after a successful generation before a contextual headline is attempted.
pub const CONTEXTUAL_COOLDOWN: Duration = Duration::from_secs(15);
/// How long a batch of periodic headlines is rotated before asking for more.
pub const HEADLINE_CACHE_TTL: Duration = Duration::from_secs(60);
/// Actions must move a line by more than this to earn an AI headline.
pub const ENRICHMENT_MIN_DIFF: f64 = 10.0;
pub const AI_PREFIX: &str = "🤖 ";

const MIN_HEADLINE_CHARS: usize = 10;
const MAX_HEADLINE_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("headline request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("headline service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("headline service returned no text")]
    EmptyResponse,
}

#[async_trait]
pub trait HeadlineWriter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError>;
}

/// Generative Language REST client.
#[derive(Debug, Clone)]
pub struct GeminiWriter {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiWriter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, EnrichmentError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{GEMINI_ENDPOINT}/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }
}

#[async_trait]
impl HeadlineWriter for GeminiWriter {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError> {
        let payload = json!({
            "contents": [
                {
                    "parts": [
                        { "text": prompt }
                    ]
                }
            ]
        });

        let response = self.client.post(self.endpoint()).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status {
                status,
                body: body.chars().take(320).collect(),
            });
        }

        let body: Value = response.json().await?;
        let text = candidate_text(&body);
        if text.trim().is_empty() {
            return Err(EnrichmentError::EmptyResponse);
        }
        Ok(text)
    }
}

fn candidate_text(body: &Value) -> String {
    body["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate["content"]["parts"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Fiscal figures quoted to the writer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlineContext {
    pub deficit: f64,
    pub gdp: f64,
    pub inflation: f64,
    pub public_mood: f64,
    pub political_capital: f64,
}

impl HeadlineContext {
    pub fn of(state: &BudgetState) -> Self {
        Self {
            deficit: state.deficit(),
            gdp: state.gdp,
            inflation: state.inflation,
            public_mood: state.public_mood,
            political_capital: state.political_capital,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlineRequest {
    pub descriptor: String,
    pub amount: f64,
    pub context: HeadlineContext,
}

/// `cut_social_protection`, `boost_health`, ...
pub fn action_descriptor(id: &str, diff: f64) -> String {
    let verb = if diff < 0.0 { "cut" } else { "boost" };
    format!("{verb}_{}", id.to_lowercase().replace(' ', "_"))
}

/// `None` unless the action made the news and moved its line by more than
/// [`ENRICHMENT_MIN_DIFF`]. `state` is the snapshot after the action.
pub fn headline_request(
    action: &BudgetAction,
    diff: f64,
    events: &[NarrativeEvent],
    state: &BudgetState,
) -> Option<HeadlineRequest> {
    if events.is_empty() || diff.abs() <= ENRICHMENT_MIN_DIFF {
        return None;
    }

    Some(HeadlineRequest {
        descriptor: action_descriptor(&action.id, diff),
        amount: diff,
        context: HeadlineContext::of(state),
    })
}

pub fn contextual_prompt(request: &HeadlineRequest) -> String {
    format!(
        "Generate ONE dramatic UK tabloid headline about this budget action:\n\n\
         Action: {}\n\
         Amount: £{}bn\n\
         Current deficit: £{:.0}bn\n\
         Public mood: {:.0}%\n\
         Political capital: {:.0}%\n\n\
         The headline should be:\n\
         - Tabloid dramatic style (The Sun, Daily Mail)\n\
         - 8-15 words\n\
         - Sensationalist but believable\n\
         - Reference real UK issues\n\n\
         Return ONLY the headline, nothing else.",
        request.descriptor,
        request.amount.abs(),
        request.context.deficit,
        request.context.public_mood,
        request.context.political_capital,
    )
}

pub fn periodic_prompt(context: &HeadlineContext) -> String {
    format!(
        "You are a UK tabloid headline writer. Generate 5 dramatic, punchy headlines about the UK government budget.\n\n\
         Current fiscal context:\n\
         - Deficit: £{:.0}bn\n\
         - GDP: £{:.0}bn\n\
         - Inflation: {:.1}%\n\
         - Public Mood: {:.0}%\n\
         - Political Capital: {:.0}%\n\n\
         Generate headlines that:\n\
         1. Are tabloid-style dramatic (like The Sun, Daily Mail, Metro)\n\
         2. Reference real UK political themes (NHS, taxes, cost of living, immigration, housing)\n\
         3. Mix positive and negative angles\n\
         4. Are 8-15 words each\n\
         5. Include sensationalist language\n\n\
         Return ONLY the 5 headlines, one per line, no numbering or bullets.",
        context.deficit,
        context.gdp,
        context.inflation,
        context.public_mood,
        context.political_capital,
    )
}

pub fn is_usable_headline(text: &str) -> bool {
    let chars = text.chars().count();
    chars > MIN_HEADLINE_CHARS && chars < MAX_HEADLINE_CHARS
}

pub fn ai_event(headline: &str) -> NarrativeEvent {
    NarrativeEvent::new(NarrativeKind::Ai, format!("{AI_PREFIX}{headline}"))
}

#[derive(Debug, Default)]
struct DeskState {
    cache: VecDeque<String>,
    last_generation: Option<Instant>,
}

/// Rate-limited front for a [`HeadlineWriter`]. Contextual and periodic
/// generations share one clock.
pub struct HeadlineDesk {
    writer: Arc<dyn HeadlineWriter>,
    state: Mutex<DeskState>,
}

impl HeadlineDesk {
    pub fn new(writer: Arc<dyn HeadlineWriter>) -> Self {
        Self {
            writer,
            state: Mutex::new(DeskState::default()),
        }
    }

    pub async fn contextual(&self, request: &HeadlineRequest) -> Option<String> {
        self.contextual_at(request, Instant::now()).await
    }

    pub async fn contextual_at(&self, request: &HeadlineRequest, now: Instant) -> Option<String> {
        {
            let desk = self.state.lock().await;
            if desk
                .last_generation
                .is_some_and(|last| now.duration_since(last) < CONTEXTUAL_COOLDOWN)
            {
                debug!(target: "fiscal::enrichment", descriptor = %request.descriptor, "contextual headline rate limited");
                return None;
            }
        }

        let text = match self.writer.complete(&contextual_prompt(request)).await {
            Ok(text) => text,
            Err(err) => {
                warn!(target: "fiscal::enrichment", descriptor = %request.descriptor, error = %err, "contextual headline failed");
                return None;
            }
        };

        let headline = text.trim();
        if !is_usable_headline(headline) {
            debug!(target: "fiscal::enrichment", length = headline.chars().count(), "contextual headline discarded");
            return None;
        }

        self.state.lock().await.last_generation = Some(now);
        Some(headline.to_string())
    }

    pub async fn periodic(&self, context: &HeadlineContext) -> Option<String> {
        self.periodic_at(context, Instant::now()).await
    }

    pub async fn periodic_at(&self, context: &HeadlineContext, now: Instant) -> Option<String> {
        {
            let mut desk = self.state.lock().await;
            let fresh = desk
                .last_generation
                .is_some_and(|last| now.duration_since(last) < HEADLINE_CACHE_TTL);
            if fresh {
                if let Some(headline) = desk.cache.pop_front() {
                    desk.cache.push_back(headline.clone());
                    return Some(headline);
                }
            }
        }

        let text = match self.writer.complete(&periodic_prompt(context)).await {
            Ok(text) => text,
            Err(err) => {
                warn!(target: "fiscal::enrichment", error = %err, "periodic headlines failed");
                return None;
            }
        };

        let headlines = text
            .lines()
            .map(str::trim)
            .filter(|line| is_usable_headline(line))
            .map(str::to_string)
            .collect::<VecDeque<_>>();
        let first = headlines.front().cloned()?;

        info!(target: "fiscal::enrichment", count = headlines.len(), "generated AI headlines");
        let mut desk = self.state.lock().await;
        desk.cache = headlines;
        desk.last_generation = Some(now);
        Some(first)
    }
}

/// Prepend an AI headline to `events` if the desk produces one within `timeout`.
pub async fn enrich_events(
    desk: &HeadlineDesk,
    request: &HeadlineRequest,
    mut events: Vec<NarrativeEvent>,
    timeout: Duration,
) -> Vec<NarrativeEvent> {
    match tokio::time::timeout(timeout, desk.contextual(request)).await {
        Ok(Some(headline)) => events.insert(0, ai_event(&headline)),
        Ok(None) => {}
        Err(_) => {
            debug!(target: "fiscal::enrichment", descriptor = %request.descriptor, "contextual headline timed out");
        }
    }
    events
}
