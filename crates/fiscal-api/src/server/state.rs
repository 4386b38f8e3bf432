#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<ServerInner>>,
    stream_tx: broadcast::Sender<StreamMessage>,
    /// Latest snapshot for background tasks that must not take the state lock.
    snapshot_tx: Arc<watch::Sender<BudgetState>>,
    headlines: Option<Arc<HeadlineDesk>>,
    news: Arc<LiveNewsDesk>,
    /// Per-action flashes, forwarded in submission order.
    flash_tx: mpsc::Sender<PendingFlash>,
}

/// One action's template headlines, plus the request for an AI lead if eligible.
struct PendingFlash {
    tick: u64,
    events: Vec<NarrativeEvent>,
    enrichment: Option<(Arc<HeadlineDesk>, HeadlineRequest)>,
}

impl AppState {
    /// Spawns the flash forwarder, so it must run inside a tokio runtime.
    fn new(
        api: FiscalApi,
        headlines: Option<Arc<HeadlineDesk>>,
        news: Arc<LiveNewsDesk>,
        enrichment_timeout: Duration,
    ) -> Self {
        let (stream_tx, _) = broadcast::channel(STREAM_CAPACITY);
        let (snapshot_tx, _) = watch::channel(api.state().clone());
        let (flash_tx, flash_rx) = mpsc::channel(STREAM_CAPACITY);
        spawn_flash_forwarder(flash_rx, stream_tx.clone(), enrichment_timeout);
        Self {
            inner: Arc::new(Mutex::new(ServerInner { api })),
            stream_tx,
            snapshot_tx: Arc::new(snapshot_tx),
            headlines,
            news,
            flash_tx,
        }
    }

    fn publish_snapshot(&self, state: &BudgetState) {
        self.snapshot_tx.send_replace(state.clone());
    }
}

#[derive(Debug)]
struct ServerInner {
    api: FiscalApi,
}

/// Run one action through the kernel and fan its results out to subscribers.
/// Shared by the HTTP route and the socket's `update_budget` message.
async fn process_action(
    state: &AppState,
    action: BudgetAction,
) -> Result<ActionReport, HttpApiError> {
    let report = {
        let mut inner = state.inner.lock().await;
        match inner.api.submit_action(action.clone()) {
            Ok(report) => report,
            Err(error) => return Err(HttpApiError::invalid_action(error)),
        }
    };

    state.publish_snapshot(&report.state);

    let tick = report.state.tick_count;
    let mut messages = vec![StreamMessage::state_updated(&report.state)];
    if let Some(warning) = &report.warning {
        messages.push(StreamMessage::warning(tick, warning.clone()));
    }
    messages.extend(
        report
            .milestones
            .iter()
            .map(|milestone| StreamMessage::milestone(tick, milestone)),
    );
    broadcast_messages(state, messages);

    dispatch_news_flash(state, &action, &report).await;

    Ok(report)
}

async fn process_reset(state: &AppState) -> BudgetState {
    let snapshot = {
        let mut inner = state.inner.lock().await;
        inner.api.reset()
    };
    state.publish_snapshot(&snapshot);
    broadcast_messages(state, vec![StreamMessage::state_updated(&snapshot)]);
    debug!(target: "fiscal::server", "budget reset");
    snapshot
}

/// Queue the action's headlines behind any flash still waiting on an AI lead.
async fn dispatch_news_flash(state: &AppState, action: &BudgetAction, report: &ActionReport) {
    if report.events.is_empty() {
        return;
    }

    let enrichment = state.headlines.clone().and_then(|desk| {
        headline_request(action, report.diff, &report.events, &report.state)
            .map(|request| (desk, request))
    });
    let flash = PendingFlash {
        tick: report.state.tick_count,
        events: report.events.clone(),
        enrichment,
    };

    if state.flash_tx.send(flash).await.is_err() {
        warn!(target: "fiscal::server", tick = report.state.tick_count, "flash forwarder stopped; headlines dropped");
    }
}

/// Sends each flash in order. An eligible flash waits (bounded) for its AI
/// headline before anything queued after it goes out.
fn spawn_flash_forwarder(
    mut flash_rx: mpsc::Receiver<PendingFlash>,
    stream_tx: broadcast::Sender<StreamMessage>,
    enrichment_timeout: Duration,
) {
    tokio::spawn(async move {
        while let Some(PendingFlash {
            tick,
            events,
            enrichment,
        }) = flash_rx.recv().await
        {
            let events = match enrichment {
                Some((desk, request)) => {
                    enrich_events(&desk, &request, events, enrichment_timeout).await
                }
                None => events,
            };
            let _ = stream_tx.send(StreamMessage::news_flash(tick, &events));
        }
    });
}

fn broadcast_messages(state: &AppState, messages: Vec<StreamMessage>) {
    for message in messages {
        let _ = state.stream_tx.send(message);
    }
}
