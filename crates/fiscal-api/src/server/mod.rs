use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, BudgetAction, BudgetState, ErrorCode, FiscalSummary, Milestone, NarrativeEvent,
    SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::enrichment::{
    ai_event, enrich_events, headline_request, EnrichmentError, GeminiWriter, HeadlineContext,
    HeadlineDesk, HeadlineRequest,
};
use crate::news::{LiveHeadline, LiveNewsDesk, NewsError, CONNECT_REPLAY};
use crate::{ActionReport, FiscalApi};

const STREAM_CAPACITY: usize = 1024;

include!("error.rs");
include!("state.rs");
include!("routes/control.rs");
include!("routes/stream.rs");
include!("util.rs");

pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let headlines = match &config.gemini_api_key {
        Some(api_key) => {
            let writer = GeminiWriter::new(api_key.clone(), config.gemini_model.clone())?;
            Some(Arc::new(HeadlineDesk::new(Arc::new(writer))))
        }
        None => {
            warn!(target: "fiscal::server", "GEMINI_API_KEY not set; AI headlines disabled");
            None
        }
    };
    let news = Arc::new(LiveNewsDesk::new(config.news_feeds.clone())?);

    let state = AppState::new(
        FiscalApi::from_seed(config.seed),
        headlines,
        news,
        config.enrichment_timeout,
    );

    spawn_news_poller(&state, config.news_interval);
    spawn_periodic_headlines(&state, config.ai_interval);

    let app = router(state);
    let listener = TcpListener::bind(config.bind).await?;
    info!(
        target: "fiscal::server",
        addr = %config.bind,
        ai_headlines = config.enrichment_enabled(),
        feeds = config.news_feeds.len(),
        "fiscal engine listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api/v1/state", get(get_state))
        .route("/api/v1/baseline", get(get_baseline))
        .route("/api/v1/actions", post(submit_action))
        .route("/api/v1/reset", post(reset_state))
        .route("/api/v1/news", get(get_news))
        .route("/api/v1/stream", get(stream_budget))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn spawn_news_poller(state: &AppState, period: Duration) {
    let news = state.news.clone();
    let stream_tx = state.stream_tx.clone();
    let snapshots = state.snapshot_tx.subscribe();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let headlines = news.refresh().await;
            if headlines.is_empty() {
                continue;
            }
            let tick = snapshots.borrow().tick_count;
            let _ = stream_tx.send(StreamMessage::news_flash(tick, &headlines));
        }
    });
}

fn spawn_periodic_headlines(state: &AppState, period: Duration) {
    let Some(desk) = state.headlines.clone() else {
        return;
    };
    let stream_tx = state.stream_tx.clone();
    let snapshots = state.snapshot_tx.subscribe();

    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        loop {
            ticker.tick().await;
            let (context, tick) = {
                let snapshot = snapshots.borrow();
                (HeadlineContext::of(&snapshot), snapshot.tick_count)
            };
            if let Some(headline) = desk.periodic(&context).await {
                let _ = stream_tx.send(StreamMessage::news_flash(tick, &[ai_event(&headline)]));
            }
        }
    });
}

#[cfg(test)]
mod tests;
