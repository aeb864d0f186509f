use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::change_models::{ChangeEvent, ChangeKind, Record};

/// Realtime `postgres_changes` payload as pushed by the hosted database.
///
/// The feed sends `{}` rather than omitting `old` on inserts and `new` on
/// deletes; empty objects are treated as missing snapshots.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RealtimePayload {
    #[serde(rename = "eventType")]
    pub event_type: ChangeKind,
    #[serde(default)]
    pub schema: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub table: String,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub new: Option<Record>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub old: Option<Record>,
}

impl From<RealtimePayload> for ChangeEvent {
    fn from(payload: RealtimePayload) -> Self {
        Self {
            kind: payload.event_type,
            table: payload.table,
            previous: payload.old.filter(|record| !record.is_empty()),
            current: payload.new.filter(|record| !record.is_empty()),
        }
    }
}
