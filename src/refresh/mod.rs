pub mod refresh_debouncer;

pub use refresh_debouncer::{RefreshDebouncer, Refresher, RouteGuard};
