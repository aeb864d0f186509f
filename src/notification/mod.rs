pub mod notification_handlers;
pub mod notification_models;
pub mod notification_presenter;
pub mod notification_queue;

pub use notification_handlers::{delete_notification, get_notifications, notification_stream};
pub use notification_models::{Notification, NotificationId, NotificationState};
pub use notification_presenter::Presenter;
pub use notification_queue::{NotificationQueue, QueueSettings};
