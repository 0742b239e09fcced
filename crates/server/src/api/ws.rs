//! WebSocket stream of live review snapshots for one catalog item.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, StreamExt};
use phonelist_core::{MirrorStatus, ReviewLog, ReviewRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::middleware::MaybeUser;
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Message pushed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Full, timestamp-ascending review list of the item.
    Reviews {
        item_id: String,
        reviews: Vec<ReviewRecord>,
    },
    /// The live listener failed, at the first sync or later; the last list
    /// sent stays valid until the next `Reviews` message.
    Error { message: String },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::Reviews { .. } => "reviews",
            WsMessage::Error { .. } => "error",
        }
    }
}

/// GET /api/v1/ws/catalog/{id}/reviews
pub async fn reviews_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    user: MaybeUser,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, item_id, user))
}

/// Serialize and send; `false` once the client is gone.
async fn send<S>(sender: &mut S, msg: &WsMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize WsMessage: {}", e);
            return true;
        }
    };
    if sender.send(Message::Text(json.into())).await.is_err() {
        debug!("WebSocket send failed, client disconnected");
        return false;
    }
    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();
    true
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, item_id: String, user: MaybeUser) {
    let (mut sender, mut receiver) = socket.split();

    // The log lives in the send task; aborting the task drops its listener.
    let log = state.review_log(user.session());
    log.load(&item_id);

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!(item_id = %item_id, "WebSocket client connected");

    let stream_item = item_id.clone();
    let send_task = tokio::spawn(async move {
        stream_reviews(&log, &stream_item, &mut sender).await;
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Ignoring client message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!(item_id = %item_id, "WebSocket client disconnected");
}

/// Send the review list on every change and an `Error` frame each time the
/// listener fails. Returns once the client is gone or the log closes.
async fn stream_reviews<S>(log: &ReviewLog, item_id: &str, sender: &mut S)
where
    S: Sink<Message> + Unpin,
{
    let mut reviews = log.subscribe();
    let mut status = log.subscribe_status();
    log.wait_synced().await;

    let (mut reviews_changed, mut status_changed) = (true, true);
    loop {
        if status_changed {
            let failure = match &*status.borrow_and_update() {
                MirrorStatus::Failed(e) => Some(e.to_string()),
                _ => None,
            };
            if let Some(message) = failure {
                if !send(sender, &WsMessage::Error { message }).await {
                    return;
                }
            }
        }
        if reviews_changed {
            let msg = WsMessage::Reviews {
                item_id: item_id.to_string(),
                reviews: reviews.borrow_and_update().clone(),
            };
            if !send(sender, &msg).await {
                return;
            }
        }

        tokio::select! {
            changed = reviews.changed() => {
                if changed.is_err() {
                    break;
                }
                (reviews_changed, status_changed) = (true, false);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                (reviews_changed, status_changed) = (false, true);
            }
        }
    }
    debug!("Review log closed");
}
