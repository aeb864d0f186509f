use std::sync::{Arc, Mutex};

use crate::change::Record;
use crate::notification::{Notification, NotificationId, Presenter};

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Render(NotificationId, String),
    Unrender(NotificationId),
}

/// Presenter that records every call; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    calls: Arc<Mutex<Vec<PresenterCall>>>,
}

impl RecordingPresenter {
    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rendered(&self) -> Vec<NotificationId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Render(id, _) => Some(id),
                PresenterCall::Unrender(_) => None,
            })
            .collect()
    }

    pub fn unrendered(&self) -> Vec<NotificationId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Unrender(id) => Some(id),
                PresenterCall::Render(..) => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, notification: &Notification) {
        self.calls.lock().unwrap().push(PresenterCall::Render(
            notification.id,
            notification.message.clone(),
        ));
    }

    fn unrender(&mut self, id: NotificationId) {
        self.calls.lock().unwrap().push(PresenterCall::Unrender(id));
    }
}

/// Refresh counter shared between the test and the debouncer.
#[derive(Debug, Clone, Default)]
pub struct RefreshCounter {
    count: Arc<Mutex<usize>>,
}

impl RefreshCounter {
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap()
    }

    pub fn refresher(&self) -> impl FnMut() + Send + 'static {
        let count = self.count.clone();
        move || *count.lock().unwrap() += 1
    }
}

pub fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}
