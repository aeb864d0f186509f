use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Row snapshot as delivered by the change feed.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "INSERT"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single row change. `previous` is absent for inserts and `current` for
/// deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    pub previous: Option<Record>,
    pub current: Option<Record>,
}

impl ChangeEvent {
    pub fn insert(table: impl Into<String>, current: Record) -> Self {
        Self {
            kind: ChangeKind::Insert,
            table: table.into(),
            previous: None,
            current: Some(current),
        }
    }

    pub fn update(table: impl Into<String>, previous: Option<Record>, current: Record) -> Self {
        Self {
            kind: ChangeKind::Update,
            table: table.into(),
            previous,
            current: Some(current),
        }
    }

    pub fn delete(table: impl Into<String>, previous: Record) -> Self {
        Self {
            kind: ChangeKind::Delete,
            table: table.into(),
            previous: Some(previous),
            current: None,
        }
    }
}
