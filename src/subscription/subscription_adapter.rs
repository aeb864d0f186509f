use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::change::ChangeEvent;
use crate::error::{AppError, Result};

/// Ordered stream of change events consumed by the dispatcher.
pub type ChangeFeed = ReceiverStream<ChangeEvent>;

/// Entry point for the realtime transport: one `deliver` call per change,
/// in the order the feed produced them.
#[derive(Clone)]
pub struct SubscriptionAdapter {
    tx: mpsc::Sender<ChangeEvent>,
}

impl SubscriptionAdapter {
    pub fn channel(buffer: usize) -> (Self, ChangeFeed) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, ReceiverStream::new(rx))
    }

    pub async fn deliver(&self, event: ChangeEvent) -> Result<()> {
        tracing::debug!(kind = %event.kind, table = %event.table, "Change event received");
        self.tx
            .send(event)
            .await
            .map_err(|_| AppError::DispatcherUnavailable)
    }
}
