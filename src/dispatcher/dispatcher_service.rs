use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::change::ChangeEvent;
use crate::classifier::{Classifier, RelevanceDecision};
use crate::error::{AppError, Result};
use crate::notification::{Notification, NotificationId, NotificationQueue, Presenter};
use crate::refresh::{RefreshDebouncer, Refresher};

#[derive(Debug)]
pub enum DispatcherCommand {
    Dismiss {
        id: NotificationId,
        reply: oneshot::Sender<bool>,
    },
    ListVisible {
        reply: oneshot::Sender<Vec<Notification>>,
    },
}

/// Cloneable way for request handlers to reach the dispatcher task.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<DispatcherCommand>,
}

impl DispatcherHandle {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<DispatcherCommand>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub async fn dismiss(&self, id: NotificationId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(DispatcherCommand::Dismiss { id, reply }).await?;
        rx.await.map_err(|_| AppError::DispatcherUnavailable)
    }

    pub async fn list_visible(&self) -> Result<Vec<Notification>> {
        let (reply, rx) = oneshot::channel();
        self.send(DispatcherCommand::ListVisible { reply }).await?;
        rx.await.map_err(|_| AppError::DispatcherUnavailable)
    }

    async fn send(&self, command: DispatcherCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| AppError::DispatcherUnavailable)
    }
}

/// The one task that owns classifier, queue and debouncer state.
pub struct Dispatcher<P, R> {
    classifier: Classifier,
    queue: NotificationQueue<P>,
    debouncer: RefreshDebouncer<R>,
}

impl<P: Presenter, R: Refresher> Dispatcher<P, R> {
    pub fn new(
        classifier: Classifier,
        queue: NotificationQueue<P>,
        debouncer: RefreshDebouncer<R>,
    ) -> Self {
        Self {
            classifier,
            queue,
            debouncer,
        }
    }

    /// Classify one event and, when relevant, queue a toast and arm the
    /// refresh. Nothing is shown until the next `tick`.
    pub fn handle_event(&mut self, event: &ChangeEvent) -> RelevanceDecision {
        let decision = self.classifier.classify(event);

        match &decision {
            RelevanceDecision::Notify { message, entity_id } => {
                let notification = self.queue.enqueue(message.clone());
                info!(
                    id = %notification.id,
                    table = %event.table,
                    entity = entity_id.as_deref().unwrap_or("-"),
                    "Queued notification"
                );
                self.debouncer.on_relevant_event();
            }
            RelevanceDecision::Ignore => {
                debug!(kind = %event.kind, table = %event.table, "Change not relevant to viewer");
            }
        }

        decision
    }

    pub fn handle_command(&mut self, command: DispatcherCommand) {
        // A dropped reply receiver just means the caller went away.
        match command {
            DispatcherCommand::Dismiss { id, reply } => {
                let _ = reply.send(self.queue.dismiss(id).is_some());
            }
            DispatcherCommand::ListVisible { reply } => {
                let _ = reply.send(self.queue.list_visible());
            }
        }
    }

    /// Run every timer that is due.
    pub fn tick(&mut self) {
        self.queue.tick();
        self.debouncer.tick();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.queue.next_deadline(), self.debouncer.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// No toast alive and no refresh pending.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.debouncer.is_armed()
    }

    /// Drive the notifier until the change feed ends and every toast and
    /// pending refresh has played out.
    pub async fn run<S>(mut self, mut feed: S, mut commands: mpsc::Receiver<DispatcherCommand>)
    where
        S: Stream<Item = ChangeEvent> + Unpin,
    {
        let mut feed_open = true;
        let mut commands_open = true;
        info!("Dispatcher started for viewer {}", self.classifier.viewer().identity);

        loop {
            if !feed_open && self.is_idle() {
                break;
            }
            let deadline = self.next_deadline();

            tokio::select! {
                event = feed.next(), if feed_open => match event {
                    Some(event) => {
                        self.handle_event(&event);
                        feed_open = self.drain_ready(&mut feed);
                    }
                    None => {
                        info!("Change feed closed");
                        feed_open = false;
                    }
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => commands_open = false,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {}
                else => break,
            }

            self.tick();
        }

        info!("Dispatcher stopped");
    }

    // Events that arrived together are classified as one batch before the
    // queue is ticked, so a burst is trimmed to capacity before display.
    // Returns whether the feed is still open.
    fn drain_ready<S>(&mut self, feed: &mut S) -> bool
    where
        S: Stream<Item = ChangeEvent> + Unpin,
    {
        while let Some(next) = feed.next().now_or_never() {
            match next {
                Some(event) => {
                    self.handle_event(&event);
                }
                None => {
                    info!("Change feed closed");
                    return false;
                }
            }
        }
        true
    }
}
