use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::clock::Clock;
use crate::session::SessionContext;

use super::notification_models::{Notification, NotificationId, NotificationState};
use super::notification_presenter::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub display_duration: Duration,
    /// Upper bound on live entries; oldest pending entries go first.
    pub capacity: Option<usize>,
    /// Upper bound on simultaneously visible toasts. `Some(0)` is treated
    /// as `Some(1)`.
    pub max_visible: Option<usize>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            display_duration: Duration::from_millis(5000),
            capacity: None,
            max_visible: None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    notification: Notification,
    expires_at: Option<Instant>,
}

/// Bounded toast queue. Entries move Pending -> Visible -> Expired and each
/// visible entry carries its own deadline.
pub struct NotificationQueue<P> {
    entries: VecDeque<Entry>,
    next_id: u64,
    dropped: u64,
    settings: QueueSettings,
    clock: Arc<dyn Clock>,
    presenter: P,
}

impl<P: Presenter> NotificationQueue<P> {
    pub fn new(session: &SessionContext, mut settings: QueueSettings, presenter: P) -> Self {
        settings.max_visible = settings.max_visible.map(|max| max.max(1));
        Self {
            entries: VecDeque::new(),
            next_id: 0,
            dropped: 0,
            settings,
            clock: session.clock.clone(),
            presenter,
        }
    }

    /// Records a Pending entry. Nothing is rendered until the next `tick`,
    /// so a burst enqueued before ticking is trimmed to capacity first.
    pub fn enqueue(&mut self, message: impl Into<String>) -> Notification {
        self.next_id += 1;
        let notification = Notification {
            id: NotificationId(self.next_id),
            message: message.into(),
            created_at: self.clock.wall_clock(),
            state: NotificationState::Pending,
        };

        self.entries.push_back(Entry {
            notification: notification.clone(),
            expires_at: None,
        });
        self.enforce_capacity();

        notification
    }

    /// Idempotent. Returns the removed entry, now Expired, or `None` when
    /// nothing live had that id.
    pub fn dismiss(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.entries.iter().position(|e| e.notification.id == id)?;
        let mut notification = self.entries.remove(index)?.notification;

        if notification.state == NotificationState::Visible {
            self.presenter.unrender(id);
        }
        notification.state = NotificationState::Expired;
        debug!(%id, "Notification dismissed");
        Some(notification)
    }

    pub fn tick(&mut self) {
        let now = self.clock.now();

        let presenter = &mut self.presenter;
        self.entries.retain(|entry| {
            let due = entry.expires_at.is_some_and(|at| at <= now);
            if due {
                presenter.unrender(entry.notification.id);
            }
            !due
        });

        let mut visible = self.visible_count();
        for entry in self.entries.iter_mut() {
            if self.settings.max_visible.is_some_and(|max| visible >= max) {
                break;
            }
            if entry.notification.state != NotificationState::Pending {
                continue;
            }
            entry.notification.state = NotificationState::Visible;
            entry.expires_at = Some(now + self.settings.display_duration);
            self.presenter.render(&entry.notification);
            visible += 1;
        }
    }

    pub fn list_visible(&self) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|e| e.notification.state == NotificationState::Visible)
            .map(|e| e.notification.clone())
            .collect()
    }

    /// Earliest moment a visible entry is due to expire.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().filter_map(|e| e.expires_at).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.count_in(NotificationState::Visible)
    }

    pub fn pending_count(&self) -> usize {
        self.count_in(NotificationState::Pending)
    }

    /// Pending entries discarded because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    fn count_in(&self, state: NotificationState) -> usize {
        self.entries
            .iter()
            .filter(|e| e.notification.state == state)
            .count()
    }

    // Visible entries and the entry just pushed are never candidates; if
    // nothing else is pending the queue runs over capacity until timers fire.
    fn enforce_capacity(&mut self) {
        let Some(capacity) = self.settings.capacity else {
            return;
        };

        while self.entries.len() > capacity {
            let newest = self.entries.len() - 1;
            let Some(index) = self
                .entries
                .iter()
                .take(newest)
                .position(|e| e.notification.state == NotificationState::Pending)
            else {
                break;
            };

            if let Some(entry) = self.entries.remove(index) {
                self.dropped += 1;
                debug!(id = %entry.notification.id, "Queue full, dropped pending notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::{Role, ViewerContext};
    use crate::test_utils::{PresenterCall, RecordingPresenter};

    fn queue_with(
        settings: QueueSettings,
    ) -> (NotificationQueue<RecordingPresenter>, ManualClock, RecordingPresenter) {
        let clock = ManualClock::new();
        let session = SessionContext::with_clock(
            ViewerContext::new("doc1", Role::Doctor),
            Arc::new(clock.clone()),
        );
        let presenter = RecordingPresenter::default();
        let queue = NotificationQueue::new(&session, settings, presenter.clone());
        (queue, clock, presenter)
    }

    #[test]
    fn test_enqueue_assigns_increasing_ids() {
        let (mut queue, _, _) = queue_with(QueueSettings::default());

        let first = queue.enqueue("one");
        let second = queue.enqueue("two");

        assert!(second.id > first.id);
        assert_eq!(first.state, NotificationState::Pending);
    }

    #[test]
    fn test_tick_renders_then_expires_after_display_duration() {
        let (mut queue, clock, presenter) = queue_with(QueueSettings::default());
        let notification = queue.enqueue("New appointments request received");

        queue.tick();
        assert_eq!(
            presenter.calls(),
            vec![PresenterCall::Render(
                notification.id,
                "New appointments request received".to_string()
            )]
        );
        assert_eq!(queue.list_visible().len(), 1);

        clock.advance(Duration::from_millis(4999));
        queue.tick();
        assert_eq!(queue.visible_count(), 1);

        clock.advance(Duration::from_millis(1));
        queue.tick();
        assert!(queue.is_empty());
        assert_eq!(presenter.unrendered(), vec![notification.id]);
    }

    #[test]
    fn test_timers_are_independent() {
        let (mut queue, clock, presenter) = queue_with(QueueSettings::default());
        let first = queue.enqueue("first");
        queue.tick();

        clock.advance(Duration::from_millis(2000));
        let second = queue.enqueue("second");
        queue.tick();

        clock.advance(Duration::from_millis(3000));
        queue.tick();
        assert_eq!(presenter.unrendered(), vec![first.id]);
        assert_eq!(queue.next_deadline(), Some(clock.now() + Duration::from_millis(2000)));

        clock.advance(Duration::from_millis(2000));
        queue.tick();
        assert_eq!(presenter.unrendered(), vec![first.id, second.id]);
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let (mut queue, _, presenter) = queue_with(QueueSettings::default());
        let notification = queue.enqueue("hello");
        queue.tick();

        let dismissed = queue.dismiss(notification.id).unwrap();
        assert_eq!(dismissed.state, NotificationState::Expired);
        let after_first = (queue.len(), presenter.calls());

        assert!(queue.dismiss(notification.id).is_none());
        assert_eq!((queue.len(), presenter.calls()), after_first);
        assert_eq!(presenter.unrendered(), vec![notification.id]);
    }

    #[test]
    fn test_dismiss_unknown_id_is_noop() {
        let (mut queue, _, presenter) = queue_with(QueueSettings::default());
        assert!(queue.dismiss(NotificationId(99)).is_none());
        assert!(presenter.calls().is_empty());
    }

    #[test]
    fn test_dismiss_pending_skips_unrender() {
        let (mut queue, _, presenter) = queue_with(QueueSettings::default());
        let notification = queue.enqueue("never shown");

        assert!(queue.dismiss(notification.id).is_some());
        queue.tick();
        assert!(presenter.calls().is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest_pending() {
        let settings = QueueSettings {
            capacity: Some(20),
            ..QueueSettings::default()
        };
        let (mut queue, clock, presenter) = queue_with(settings);

        let ids: Vec<_> = (0..25).map(|i| queue.enqueue(format!("n{}", i)).id).collect();

        assert_eq!(queue.len(), 20);
        assert_eq!(queue.dropped_count(), 5);

        queue.tick();
        assert_eq!(presenter.rendered(), ids[5..].to_vec());

        clock.advance(Duration::from_millis(5000));
        queue.tick();
        assert!(queue.is_empty());
        assert_eq!(presenter.unrendered(), ids[5..].to_vec());
    }

    #[test]
    fn test_visible_entries_survive_overflow() {
        let settings = QueueSettings {
            capacity: Some(2),
            ..QueueSettings::default()
        };
        let (mut queue, _, _) = queue_with(settings);
        queue.enqueue("a");
        queue.enqueue("b");
        queue.tick();

        let c = queue.enqueue("c");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.visible_count(), 2);
        assert_eq!(queue.dropped_count(), 0);
        assert_eq!(queue.pending_count(), 1);
        assert!(queue.list_visible().iter().all(|n| n.id != c.id));
    }

    #[test]
    fn test_max_visible_holds_back_pending_entries() {
        let settings = QueueSettings {
            max_visible: Some(1),
            ..QueueSettings::default()
        };
        let (mut queue, clock, presenter) = queue_with(settings);
        let first = queue.enqueue("first");
        let second = queue.enqueue("second");

        queue.tick();
        assert_eq!(presenter.rendered(), vec![first.id]);
        assert_eq!(queue.pending_count(), 1);

        clock.advance(Duration::from_millis(5000));
        queue.tick();
        assert_eq!(presenter.rendered(), vec![first.id, second.id]);
        assert_eq!(presenter.unrendered(), vec![first.id]);

        clock.advance(Duration::from_millis(5000));
        queue.tick();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_list_visible_keeps_insertion_order() {
        let (mut queue, _, _) = queue_with(QueueSettings::default());
        queue.enqueue("a");
        queue.enqueue("b");
        queue.enqueue("c");
        queue.tick();

        let messages: Vec<_> = queue.list_visible().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_max_visible_still_shows_one() {
        let settings = QueueSettings {
            max_visible: Some(0),
            ..QueueSettings::default()
        };
        let (mut queue, clock, presenter) = queue_with(settings);
        let first = queue.enqueue("first");
        let second = queue.enqueue("second");

        queue.tick();
        assert_eq!(presenter.rendered(), vec![first.id]);

        clock.advance(Duration::from_millis(5000));
        queue.tick();
        assert_eq!(presenter.rendered(), vec![first.id, second.id]);
    }

    #[test]
    fn test_enqueued_entry_is_pending_until_tick() {
        let (mut queue, _, presenter) = queue_with(QueueSettings::default());
        queue.enqueue("later");

        assert!(queue.list_visible().is_empty());
        assert_eq!(queue.pending_count(), 1);
        assert!(presenter.calls().is_empty());

        queue.tick();
        assert_eq!(queue.list_visible().len(), 1);
    }
}
