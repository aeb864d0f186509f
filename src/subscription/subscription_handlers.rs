use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use futures::stream::{Stream, StreamExt};
use validator::Validate;

use crate::{
    change::{ChangeEvent, RealtimePayload},
    error::{AppError, Result},
    state::AppState,
};

use super::subscription_adapter::SubscriptionAdapter;

/// Push a single change event (database webhook form of the feed)
#[utoipa::path(
    post,
    path = "/api/changes",
    request_body = RealtimePayload,
    responses(
        (status = 202, description = "Change event accepted"),
        (status = 400, description = "Invalid change event"),
        (status = 503, description = "Dispatcher unavailable")
    ),
    tag = "changes"
)]
pub async fn ingest_change(
    State(state): State<AppState>,
    Json(payload): Json<RealtimePayload>,
) -> Result<StatusCode> {
    payload.validate()?;
    state.adapter.deliver(ChangeEvent::from(payload)).await?;

    Ok(StatusCode::ACCEPTED)
}

/// WebSocket upgrade handler for the realtime change feed
pub async fn change_feed_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_feed(socket, state.adapter))
}

async fn handle_feed(socket: WebSocket, adapter: SubscriptionAdapter) {
    let (_sender, receiver) = socket.split();
    tracing::info!("Change feed connected");

    forward_frames(receiver, &adapter).await;

    tracing::info!("Change feed disconnected");
}

/// Read realtime payloads, one per text frame, until the feed closes.
/// Frames that fail to decode are skipped.
async fn forward_frames<S, E>(mut frames: S, adapter: &SubscriptionAdapter)
where
    S: Stream<Item = std::result::Result<Message, E>> + Unpin,
{
    while let Some(Ok(msg)) = frames.next().await {
        match msg {
            Message::Text(text) => {
                let event = match decode_frame(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Skipping change feed frame: {}", e);
                        continue;
                    }
                };
                if adapter.deliver(event).await.is_err() {
                    tracing::error!("Dispatcher stopped, closing change feed");
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

fn decode_frame(text: &str) -> Result<ChangeEvent> {
    let payload: RealtimePayload = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Invalid change payload: {}", e)))?;
    payload.validate()?;

    Ok(ChangeEvent::from(payload))
}
