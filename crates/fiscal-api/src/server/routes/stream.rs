/// Inbound socket messages, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    UpdateBudget(BudgetAction),
    Reset,
}

async fn stream_budget(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let mut initial_messages = {
        let inner = state.inner.lock().await;
        vec![StreamMessage::state_init(inner.api.state())]
    };

    let cached_news = state.news.latest(CONNECT_REPLAY).await;
    if !cached_news.is_empty() {
        let tick = initial_messages[0].tick;
        initial_messages.push(StreamMessage::news_flash(tick, &cached_news));
    }

    ws.on_upgrade(move |socket| stream_socket(socket, state, initial_messages))
}

async fn stream_socket(mut socket: WebSocket, state: AppState, initial_messages: Vec<StreamMessage>) {
    for message in &initial_messages {
        if send_stream_message(&mut socket, message).await.is_err() {
            return;
        }
    }

    let mut rx = state.stream_tx.subscribe();

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_client_message(&state, text.as_str()).await {
                            if send_stream_message(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        break;
                    }
                    _ => {}
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(message) => {
                        if send_stream_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        let warning = StreamMessage::warning(
                            0,
                            format!("stream client lagged and skipped {skipped} message(s)"),
                        );

                        if send_stream_message(&mut socket, &warning).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }
}

/// Apply a socket message. Results reach this client through the broadcast
/// like everyone else; only failures come back as a direct reply.
async fn handle_client_message(state: &AppState, text: &str) -> Option<StreamMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(err) => {
            let error = HttpApiError::invalid_message(
                "unrecognised stream message",
                Some(err.to_string()),
            );
            return Some(StreamMessage::rejected(current_tick(state).await, &error.error));
        }
    };

    match message {
        ClientMessage::UpdateBudget(action) => match process_action(state, action).await {
            Ok(_) => None,
            Err(err) => Some(StreamMessage::rejected(current_tick(state).await, &err.error)),
        },
        ClientMessage::Reset => {
            process_reset(state).await;
            None
        }
    }
}

async fn current_tick(state: &AppState) -> u64 {
    state.inner.lock().await.api.state().tick_count
}

async fn send_stream_message(
    socket: &mut WebSocket,
    message: &StreamMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}
