#[derive(Debug, Clone, Serialize)]
struct StreamMessage {
    schema_version: String,
    #[serde(rename = "type")]
    message_type: String,
    tick: u64,
    payload: Value,
}

impl StreamMessage {
    fn new(message_type: &str, tick: u64, payload: Value) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: message_type.to_string(),
            tick,
            payload,
        }
    }

    fn state_init(state: &BudgetState) -> Self {
        Self::new("state.init", state.tick_count, state_payload(state))
    }

    fn state_updated(state: &BudgetState) -> Self {
        Self::new("state.updated", state.tick_count, state_payload(state))
    }

    /// Headlines in display order.
    fn news_flash(tick: u64, events: &[NarrativeEvent]) -> Self {
        Self::new("news.flash", tick, json!(events))
    }

    fn milestone(tick: u64, milestone: &Milestone) -> Self {
        Self::new("milestone", tick, json!(milestone))
    }

    fn warning(tick: u64, warning: String) -> Self {
        Self::new("warning", tick, json!({ "message": warning }))
    }

    fn rejected(tick: u64, error: &ApiError) -> Self {
        Self::new(
            "warning",
            tick,
            json!({ "message": error.message, "error": error }),
        )
    }
}

fn state_payload(state: &BudgetState) -> Value {
    json!({
        "state": state,
        "summary": FiscalSummary::of(state),
    })
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}
