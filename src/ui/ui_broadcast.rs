use tokio::sync::broadcast;
use tracing::info;

use crate::notification::{Notification, NotificationId, Presenter};
use crate::refresh::Refresher;

use super::ui_models::UiEvent;

/// Presenter that forwards toasts to every connected SSE client.
#[derive(Clone)]
pub struct BroadcastPresenter {
    tx: broadcast::Sender<UiEvent>,
}

impl BroadcastPresenter {
    pub fn new(tx: broadcast::Sender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl Presenter for BroadcastPresenter {
    fn render(&mut self, notification: &Notification) {
        info!(id = %notification.id, "Showing notification: {}", notification.message);
        // Ignore send errors - just means no browser is listening
        let _ = self.tx.send(UiEvent::Render {
            notification: notification.clone(),
        });
    }

    fn unrender(&mut self, id: NotificationId) {
        let _ = self.tx.send(UiEvent::Unrender { id });
    }
}

#[derive(Clone)]
pub struct BroadcastRefresher {
    tx: broadcast::Sender<UiEvent>,
}

impl BroadcastRefresher {
    pub fn new(tx: broadcast::Sender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl Refresher for BroadcastRefresher {
    fn refresh(&mut self) {
        info!("Requesting view refresh");
        let _ = self.tx.send(UiEvent::Refresh);
    }
}
