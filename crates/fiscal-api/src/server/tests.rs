use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

use super::*;
use crate::enrichment::HeadlineWriter;

fn test_state() -> AppState {
    state_with_desk(None, Duration::from_millis(100))
}

fn state_with_desk(headlines: Option<Arc<HeadlineDesk>>, timeout: Duration) -> AppState {
    let news = LiveNewsDesk::new(Vec::new()).expect("http client builds");
    AppState::new(FiscalApi::from_seed(Some(7)), headlines, Arc::new(news), timeout)
}

/// Answers every prompt with the same headline after a fixed delay.
struct SlowWriter {
    delay: Duration,
}

#[async_trait]
impl HeadlineWriter for SlowWriter {
    async fn complete(&self, _prompt: &str) -> Result<String, EnrichmentError> {
        tokio::time::sleep(self.delay).await;
        Ok("NHS CUTS SPARK FURY ACROSS THE NATION".to_string())
    }
}

async fn next_flash(rx: &mut broadcast::Receiver<StreamMessage>) -> StreamMessage {
    loop {
        let message = rx.recv().await.expect("stream open");
        if message.message_type == "news.flash" {
            return message;
        }
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[test]
fn stream_messages_carry_type_and_schema() {
    let state = fiscal_core::baseline();
    let encoded = serde_json::to_value(StreamMessage::state_init(&state)).expect("serialize");
    assert_eq!(encoded["type"], "state.init");
    assert_eq!(encoded["schema_version"], SCHEMA_VERSION_V1);
    assert_eq!(encoded["tick"], 0);
    assert_eq!(encoded["payload"]["summary"]["deficit"], 95.0);

    let events = vec![NarrativeEvent::new(contracts::NarrativeKind::Live, "LIVE: x")];
    let encoded = serde_json::to_value(StreamMessage::news_flash(3, &events)).expect("serialize");
    assert_eq!(encoded["type"], "news.flash");
    assert_eq!(encoded["payload"][0]["kind"], "LIVE");
}

#[test]
fn client_messages_follow_the_socket_protocol() {
    let update: ClientMessage = serde_json::from_str(
        r#"{"type":"update_budget","category":"expenditure","id":"Health","value":150}"#,
    )
    .expect("update parses");
    assert!(matches!(
        update,
        ClientMessage::UpdateBudget(ref action) if action == &BudgetAction::expenditure("Health", 150.0)
    ));

    let reset: ClientMessage = serde_json::from_str(r#"{"type":"reset"}"#).expect("reset parses");
    assert!(matches!(reset, ClientMessage::Reset));

    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"launch_rocket"}"#).is_err());
}

#[tokio::test]
async fn action_route_returns_report_and_broadcasts() {
    let state = test_state();
    let mut rx = state.stream_tx.subscribe();
    let app = router(state.clone());

    let response = app
        .oneshot(post_json(
            "/api/v1/actions",
            r#"{"category":"expenditure","id":"Health","value":150}"#,
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );

    let body = body_json(response).await;
    assert_eq!(body["state"]["tickCount"], 1);
    assert_eq!(body["events"][0]["kind"], "CRISIS");
    assert!(body["milestones"].as_array().is_some());

    let first = rx.recv().await.expect("state broadcast");
    assert_eq!(first.message_type, "state.updated");
    let second = rx.recv().await.expect("news broadcast");
    assert_eq!(second.message_type, "news.flash");
    assert_eq!(second.payload.as_array().map(Vec::len), Some(2));

    assert_eq!(state.snapshot_tx.borrow().tick_count, 1);
}

#[tokio::test]
async fn invalid_action_is_a_400_with_error_code() {
    let app = router(test_state());
    let response = app
        .oneshot(post_json(
            "/api/v1/actions",
            r#"{"category":"expenditure","id":"Nonexistent","value":10}"#,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "INVALID_ACTION");
}

#[tokio::test]
async fn reset_route_restores_the_baseline() {
    let state = test_state();
    router(state.clone())
        .oneshot(post_json(
            "/api/v1/actions",
            r#"{"category":"revenue","id":"VAT","value":240}"#,
        ))
        .await
        .expect("router responds");

    let response = router(state.clone())
        .oneshot(post_json("/api/v1/reset", ""))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let reset = body_json(response).await;

    let response = router(state)
        .oneshot(get("/api/v1/baseline"))
        .await
        .expect("router responds");
    let baseline = body_json(response).await;
    assert_eq!(reset["state"], baseline["state"]);
    assert_eq!(reset["state"]["tickCount"], 0);
}

#[tokio::test]
async fn read_routes_answer() {
    let state = test_state();

    let response = router(state.clone())
        .oneshot(get("/"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router(state.clone())
        .oneshot(get("/api/v1/state"))
        .await
        .expect("router responds");
    let body = body_json(response).await;
    assert_eq!(body["summary"]["stance"], "emergency");

    let response = router(state)
        .oneshot(get("/api/v1/news"))
        .await
        .expect("router responds");
    let body = body_json(response).await;
    assert_eq!(body["headlines"], json!([]));
}

#[tokio::test]
async fn preflight_is_answered_by_cors_layer() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/actions")
        .body(Body::empty())
        .expect("request builds");
    let response = router(test_state())
        .oneshot(request)
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn socket_messages_drive_the_same_pipeline() {
    let state = test_state();

    let reply = handle_client_message(
        &state,
        r#"{"type":"update_budget","category":"revenue","id":"Income Tax","value":300}"#,
    )
    .await;
    assert!(reply.is_none());
    assert_eq!(state.inner.lock().await.api.state().tick_count, 1);

    let reply = handle_client_message(
        &state,
        r#"{"type":"update_budget","category":"revenue","id":"Debt Interest","value":1}"#,
    )
    .await
    .expect("rejection is reported");
    assert_eq!(reply.message_type, "warning");
    assert_eq!(reply.tick, 1);
    assert_eq!(reply.payload["error"]["error_code"], "INVALID_ACTION");

    assert!(handle_client_message(&state, r#"{"type":"reset"}"#).await.is_none());
    assert_eq!(state.inner.lock().await.api.state().tick_count, 0);

    let reply = handle_client_message(&state, "not json")
        .await
        .expect("garbage is reported");
    assert_eq!(reply.payload["error"]["error_code"], "INVALID_QUERY");
}

#[tokio::test]
async fn flashes_keep_action_order_while_enrichment_is_pending() {
    let writer = Arc::new(SlowWriter {
        delay: Duration::from_millis(200),
    });
    let desk = Arc::new(HeadlineDesk::new(writer));
    let state = state_with_desk(Some(desk), Duration::from_secs(2));
    let mut rx = state.stream_tx.subscribe();

    // Eligible for an AI lead: a 30bn cut.
    router(state.clone())
        .oneshot(post_json(
            "/api/v1/actions",
            r#"{"category":"expenditure","id":"Health","value":150}"#,
        ))
        .await
        .expect("router responds");
    // Not eligible: an 8bn boost goes straight to the queue.
    router(state.clone())
        .oneshot(post_json(
            "/api/v1/actions",
            r#"{"category":"expenditure","id":"Health","value":158}"#,
        ))
        .await
        .expect("router responds");

    let first = next_flash(&mut rx).await;
    assert_eq!(first.tick, 1);
    assert_eq!(first.payload[0]["kind"], "AI");
    assert_eq!(first.payload[1]["kind"], "CRISIS");

    let second = next_flash(&mut rx).await;
    assert_eq!(second.tick, 2);
    assert_eq!(second.payload[0]["kind"], "UPDATE");
}

#[tokio::test]
async fn rejection_replies_carry_the_live_tick() {
    let state = test_state();
    router(state.clone())
        .oneshot(post_json(
            "/api/v1/actions",
            r#"{"category":"revenue","id":"VAT","value":190}"#,
        ))
        .await
        .expect("router responds");

    let reply = handle_client_message(&state, "{}")
        .await
        .expect("garbage is reported");
    assert_eq!(reply.tick, 1);
}
