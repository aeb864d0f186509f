pub mod subscription_adapter;
pub mod subscription_handlers;

pub use subscription_adapter::{ChangeFeed, SubscriptionAdapter};
pub use subscription_handlers::{change_feed_ws, ingest_change};
