pub mod change;
pub mod classifier;
pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod notification;
pub mod refresh;
pub mod routes;
pub mod session;
pub mod state;
pub mod subscription;
pub mod ui;

#[cfg(test)]
mod test_utils;

pub use change::{ChangeEvent, ChangeKind};
pub use classifier::{Classifier, ClassifierConfig, RelevanceDecision};
pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use notification::{Notification, NotificationQueue, Presenter, QueueSettings};
pub use refresh::{RefreshDebouncer, Refresher, RouteGuard};
pub use session::{Role, SessionContext, ViewerContext};
pub use state::{AppState, Config};
