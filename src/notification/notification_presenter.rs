use super::notification_models::{Notification, NotificationId};

/// UI side of the queue: show a toast, take it down again.
pub trait Presenter: Send {
    fn render(&mut self, notification: &Notification);
    fn unrender(&mut self, id: NotificationId);
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn render(&mut self, notification: &Notification) {
        (**self).render(notification)
    }

    fn unrender(&mut self, id: NotificationId) {
        (**self).unrender(id)
    }
}
