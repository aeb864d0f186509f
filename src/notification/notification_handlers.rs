use crate::{
    dispatcher::DispatcherHandle,
    error::{AppError, Result},
    state::AppState,
    ui::UiEvent,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use super::notification_models::{Notification, NotificationId};

/// Get the notifications currently on screen
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Visible notifications in display order", body = Vec<Notification>),
        (status = 503, description = "Dispatcher unavailable")
    ),
    tag = "notifications"
)]
pub async fn get_notifications(State(state): State<AppState>) -> Result<Json<Vec<Notification>>> {
    let notifications = state.dispatcher.list_visible().await?;

    Ok(Json(notifications))
}

/// Subscribe to toast and refresh events via Server-Sent Events
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    responses(
        (status = 200, description = "SSE stream of render, unrender, resync and refresh events")
    ),
    tag = "notifications"
)]
pub async fn notification_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = ui_event_stream(state.ui_tx.subscribe(), state.dispatcher).filter_map(
        |ui_event| async move {
            Event::default()
                .event(ui_event.name())
                .json_data(&ui_event)
                .map_err(|e| tracing::error!("Failed to encode UI event: {}", e))
                .ok()
                .map(Ok::<Event, Infallible>)
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// A client that falls behind the broadcast buffer gets the current set of
// visible toasts in place of the events it missed.
fn ui_event_stream(
    rx: broadcast::Receiver<UiEvent>,
    dispatcher: DispatcherHandle,
) -> impl Stream<Item = UiEvent> {
    BroadcastStream::new(rx).filter_map(move |msg| {
        let dispatcher = dispatcher.clone();
        async move {
            match msg {
                Ok(ui_event) => Some(ui_event),
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    tracing::warn!("SSE client missed {} events, resyncing", missed);
                    match dispatcher.list_visible().await {
                        Ok(notifications) => Some(UiEvent::Resync { notifications }),
                        Err(e) => {
                            tracing::error!("Resync failed: {}", e);
                            None
                        }
                    }
                }
            }
        }
    })
}

/// Dismiss a notification
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(
        ("id" = u64, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification dismissed"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<u64>,
) -> Result<StatusCode> {
    let dismissed = state.dispatcher.dismiss(NotificationId(notification_id)).await?;

    if !dismissed {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
