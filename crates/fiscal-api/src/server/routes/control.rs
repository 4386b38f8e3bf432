#[derive(Debug, Serialize)]
struct StateResponse {
    schema_version: String,
    state: BudgetState,
    summary: FiscalSummary,
}

impl StateResponse {
    fn of(state: BudgetState) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            summary: FiscalSummary::of(&state),
            state,
        }
    }
}

#[derive(Debug, Serialize)]
struct ActionResponse {
    schema_version: String,
    #[serde(flatten)]
    report: ActionReport,
}

#[derive(Debug, Serialize)]
struct NewsResponse {
    schema_version: String,
    headlines: Vec<LiveHeadline>,
}

async fn liveness() -> &'static str {
    "Fiscal simulation engine running"
}

async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let snapshot = {
        let inner = state.inner.lock().await;
        inner.api.state().clone()
    };
    Json(StateResponse::of(snapshot))
}

async fn get_baseline(State(state): State<AppState>) -> Json<StateResponse> {
    let baseline = {
        let inner = state.inner.lock().await;
        inner.api.baseline()
    };
    Json(StateResponse::of(baseline))
}

async fn submit_action(
    State(state): State<AppState>,
    Json(action): Json<BudgetAction>,
) -> Result<Json<ActionResponse>, HttpApiError> {
    let report = match process_action(&state, action.clone()).await {
        Ok(report) => report,
        Err(err) => {
            debug!(target: "fiscal::server", action = %action, "action rejected over http");
            return Err(err);
        }
    };

    Ok(Json(ActionResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        report,
    }))
}

async fn reset_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse::of(process_reset(&state).await))
}

async fn get_news(State(state): State<AppState>) -> Json<NewsResponse> {
    Json(NewsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        headlines: state.news.cached().await,
    })
}
