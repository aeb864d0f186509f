use serde_json::Value;
use tracing::{debug, warn};

use crate::change::{ChangeEvent, ChangeKind, Record};
use crate::error::EventError;
use crate::session::{SessionContext, ViewerContext};

use super::classifier_models::{ClassifierConfig, DeletePolicy, RelevanceDecision};

/// Decides which change events concern the current viewer.
#[derive(Debug, Clone)]
pub struct Classifier {
    viewer: ViewerContext,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(session: &SessionContext, config: ClassifierConfig) -> Self {
        Self {
            viewer: session.viewer.clone(),
            config,
        }
    }

    pub fn viewer(&self) -> &ViewerContext {
        &self.viewer
    }

    /// Rejected events are logged and come back as `Ignore`; one bad event
    /// must not stop the stream.
    pub fn classify(&self, event: &ChangeEvent) -> RelevanceDecision {
        match self.evaluate(event) {
            Ok(decision) => decision,
            Err(err) => {
                warn!("Ignoring change event: {}", err);
                RelevanceDecision::Ignore
            }
        }
    }

    pub fn evaluate(&self, event: &ChangeEvent) -> Result<RelevanceDecision, EventError> {
        if !self.config.knows_table(&event.table) {
            return Err(EventError::UnknownTable(event.table.clone()));
        }

        match event.kind {
            ChangeKind::Insert => self.classify_insert(event),
            ChangeKind::Update => self.classify_update(event),
            ChangeKind::Delete => self.classify_delete(event),
        }
    }

    fn classify_insert(&self, event: &ChangeEvent) -> Result<RelevanceDecision, EventError> {
        let current = require(event, event.current.as_ref(), "current")?;

        if !self.config.insert_scope.allows(&self.viewer.role) {
            return Ok(RelevanceDecision::Ignore);
        }
        let Some(owner_field) = self.config.owner_fields.get(&event.table) else {
            debug!("No owner field mapped for `{}`, skipping insert", event.table);
            return Ok(RelevanceDecision::Ignore);
        };
        if !self.is_viewer(current.get(owner_field)) {
            return Ok(RelevanceDecision::Ignore);
        }

        Ok(self.notify(&self.config.templates.insert, &event.table, None, current))
    }

    fn classify_update(&self, event: &ChangeEvent) -> Result<RelevanceDecision, EventError> {
        let current = require(event, event.current.as_ref(), "current")?;
        // Without the old row there is no way to tell whether the status moved.
        let previous = require(event, event.previous.as_ref(), "previous")?;

        if !self.config.update_scope.allows(&self.viewer.role) {
            return Ok(RelevanceDecision::Ignore);
        }
        let Some(subject_field) = self.config.subject_fields.get(&event.table) else {
            debug!("No subject field mapped for `{}`, skipping update", event.table);
            return Ok(RelevanceDecision::Ignore);
        };
        if !self.is_viewer(current.get(subject_field)) {
            return Ok(RelevanceDecision::Ignore);
        }

        let status_field = &self.config.status_field;
        let new_status = current.get(status_field);
        if previous.get(status_field) == new_status {
            return Ok(RelevanceDecision::Ignore);
        }

        let status = new_status.map(display_value).unwrap_or_else(|| "unknown".to_string());
        Ok(self.notify(&self.config.templates.update, &event.table, Some(&status), current))
    }

    fn classify_delete(&self, event: &ChangeEvent) -> Result<RelevanceDecision, EventError> {
        let previous = require(event, event.previous.as_ref(), "previous")?;

        if !self.config.delete_scope.allows(&self.viewer.role) {
            return Ok(RelevanceDecision::Ignore);
        }
        let fields = match self.config.delete_policy {
            DeletePolicy::Ignore => return Ok(RelevanceDecision::Ignore),
            DeletePolicy::Owner => &self.config.owner_fields,
            DeletePolicy::Subject => &self.config.subject_fields,
        };
        let Some(field) = fields.get(&event.table) else {
            return Ok(RelevanceDecision::Ignore);
        };
        if !self.is_viewer(previous.get(field)) {
            return Ok(RelevanceDecision::Ignore);
        }

        Ok(self.notify(&self.config.templates.delete, &event.table, None, previous))
    }

    fn is_viewer(&self, value: Option<&Value>) -> bool {
        value
            .and_then(id_string)
            .is_some_and(|id| id == self.viewer.identity)
    }

    fn notify(
        &self,
        template: &str,
        table: &str,
        status: Option<&str>,
        record: &Record,
    ) -> RelevanceDecision {
        let message = template
            .replace("{table}", table)
            .replace("{entity}", &entity_label(table))
            .replace("{status}", status.unwrap_or_default());

        RelevanceDecision::Notify {
            message,
            entity_id: record.get(&self.config.id_field).and_then(id_string),
        }
    }
}

fn require<'a>(
    event: &ChangeEvent,
    snapshot: Option<&'a Record>,
    missing: &'static str,
) -> Result<&'a Record, EventError> {
    snapshot.ok_or_else(|| EventError::MalformedEvent {
        kind: event.kind,
        table: event.table.clone(),
        missing,
    })
}

/// Ids arrive as JSON strings or numbers depending on the column type.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `appointments` -> `Appointment`, `categories` -> `Category`.
fn entity_label(table: &str) -> String {
    let singular = if let Some(stem) = table.strip_suffix("ies") {
        format!("{}y", stem)
    } else if table.ends_with("ss") {
        table.to_string()
    } else {
        table.strip_suffix('s').unwrap_or(table).to_string()
    };

    let mut chars = singular.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
