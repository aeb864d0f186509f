pub mod ui_broadcast;
pub mod ui_handlers;
pub mod ui_models;

pub use ui_broadcast::{BroadcastPresenter, BroadcastRefresher};
pub use ui_handlers::update_view;
pub use ui_models::{UiEvent, UpdateViewRequest};
