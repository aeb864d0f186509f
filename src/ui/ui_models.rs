use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::notification::{Notification, NotificationId};

/// Side effects pushed to the browser over SSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Render { notification: Notification },
    Unrender { id: NotificationId },
    /// Sent to a client that fell behind: replace every toast on screen
    /// with `notifications`, then keep applying events by id.
    Resync { notifications: Vec<Notification> },
    Refresh,
}

impl UiEvent {
    /// SSE event name, so clients can attach one listener per kind.
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Render { .. } => "render",
            UiEvent::Unrender { .. } => "unrender",
            UiEvent::Resync { .. } => "resync",
            UiEvent::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateViewRequest {
    #[validate(length(min = 1, max = 2048))]
    pub path: String,
}
