pub mod change_dto;
pub mod change_models;

pub use change_dto::RealtimePayload;
pub use change_models::{ChangeEvent, ChangeKind, Record};
