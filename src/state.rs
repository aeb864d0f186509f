use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::Instrument;

use crate::classifier::{Classifier, ClassifierConfig, DeletePolicy, MessageTemplates, RoleScope};
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::error::{AppError, Result};
use crate::notification::{NotificationQueue, QueueSettings};
use crate::refresh::{RefreshDebouncer, RouteGuard};
use crate::session::{SessionContext, ViewerContext};
use crate::subscription::SubscriptionAdapter;
use crate::ui::{BroadcastPresenter, BroadcastRefresher, UiEvent};

#[derive(Clone)]
pub struct AppState {
    pub adapter: SubscriptionAdapter,
    pub dispatcher: DispatcherHandle,
    pub ui_tx: broadcast::Sender<UiEvent>,
    pub view_tx: Arc<watch::Sender<String>>,
}

impl AppState {
    /// Wire up one viewer session and spawn its dispatcher task.
    pub fn spawn(config: &Config, session: &SessionContext) -> Self {
        let (ui_tx, _) = broadcast::channel(100);
        let (view_tx, view_rx) = watch::channel(config.initial_view.clone());
        let (adapter, feed) = SubscriptionAdapter::channel(config.feed_buffer);
        let (dispatcher_handle, commands) = DispatcherHandle::channel(32);

        let dispatcher = Dispatcher::new(
            Classifier::new(session, config.classifier.clone()),
            NotificationQueue::new(session, config.queue, BroadcastPresenter::new(ui_tx.clone())),
            RefreshDebouncer::new(
                session,
                config.quiet_window,
                RouteGuard::path_contains(view_rx, config.refresh_route_marker.clone()),
                BroadcastRefresher::new(ui_tx.clone()),
            ),
        );

        let span = tracing::info_span!(
            "dispatcher",
            session = %session.session_id,
            viewer = %session.viewer.identity,
            role = %session.viewer.role,
        );
        tokio::spawn(dispatcher.run(feed, commands).instrument(span));

        Self {
            adapter,
            dispatcher: dispatcher_handle,
            ui_tx,
            view_tx: Arc::new(view_tx),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub viewer: ViewerContext,
    pub classifier: ClassifierConfig,
    pub queue: QueueSettings,
    pub quiet_window: Duration,
    pub refresh_route_marker: String,
    pub initial_view: String,
    pub feed_buffer: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; unset keys take the
    /// defaults listed in `.env.example`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
        };

        let viewer = ViewerContext::new(
            require("NOTIFIER_VIEWER_ID")?,
            require("NOTIFIER_VIEWER_ROLE")?
                .parse()
                .map_err(|_| AppError::Config("NOTIFIER_VIEWER_ROLE is invalid".to_string()))?,
        );

        let defaults = MessageTemplates::default();
        let classifier = ClassifierConfig {
            owner_fields: parse_field_map(
                "NOTIFIER_OWNER_FIELDS",
                &get("NOTIFIER_OWNER_FIELDS", "appointments:doctor_id"),
            )?,
            subject_fields: parse_field_map(
                "NOTIFIER_SUBJECT_FIELDS",
                &get("NOTIFIER_SUBJECT_FIELDS", "appointments:patient_id"),
            )?,
            status_field: get("NOTIFIER_STATUS_FIELD", "status"),
            id_field: get("NOTIFIER_ID_FIELD", "id"),
            insert_scope: parse_scope("NOTIFIER_INSERT_ROLES", &get("NOTIFIER_INSERT_ROLES", "doctor"))?,
            update_scope: parse_scope("NOTIFIER_UPDATE_ROLES", &get("NOTIFIER_UPDATE_ROLES", "patient"))?,
            delete_scope: parse_scope("NOTIFIER_DELETE_ROLES", &get("NOTIFIER_DELETE_ROLES", "*"))?,
            delete_policy: get("NOTIFIER_DELETE_POLICY", "ignore")
                .parse::<DeletePolicy>()
                .map_err(|e| AppError::Config(format!("NOTIFIER_DELETE_POLICY: {}", e)))?,
            templates: MessageTemplates {
                insert: get("NOTIFIER_INSERT_MESSAGE", &defaults.insert),
                update: get("NOTIFIER_UPDATE_MESSAGE", &defaults.update),
                delete: get("NOTIFIER_DELETE_MESSAGE", &defaults.delete),
            },
        };

        let queue = QueueSettings {
            display_duration: parse_millis("NOTIFIER_DISPLAY_MS", &get("NOTIFIER_DISPLAY_MS", "5000"))?,
            capacity: parse_limit("NOTIFIER_QUEUE_CAPACITY", &get("NOTIFIER_QUEUE_CAPACITY", "20"))?,
            max_visible: parse_limit(
                "NOTIFIER_MAX_VISIBLE",
                &get("NOTIFIER_MAX_VISIBLE", "unbounded"),
            )?,
        };

        Ok(Self {
            host: get("HOST", "127.0.0.1"),
            port: parse_number("PORT", &get("PORT", "3000"))?,
            viewer,
            classifier,
            queue,
            quiet_window: parse_millis(
                "NOTIFIER_QUIET_WINDOW_MS",
                &get("NOTIFIER_QUIET_WINDOW_MS", "3000"),
            )?,
            refresh_route_marker: get("NOTIFIER_REFRESH_ROUTE", "dashboard"),
            initial_view: get("NOTIFIER_INITIAL_VIEW", "/dashboard"),
            feed_buffer: parse_number("NOTIFIER_FEED_BUFFER", &get("NOTIFIER_FEED_BUFFER", "256"))?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `table:field, table:field`
fn parse_field_map(key: &str, raw: &str) -> Result<HashMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((table, field)) if !table.trim().is_empty() && !field.trim().is_empty() => {
                Ok((table.trim().to_string(), field.trim().to_string()))
            }
            _ => Err(AppError::Config(format!(
                "{} expects table:field pairs, got `{}`",
                key, pair
            ))),
        })
        .collect()
}

/// `*` or a role list; an empty list would switch the rule off silently.
fn parse_scope(key: &str, raw: &str) -> Result<RoleScope> {
    let scope = match raw.parse() {
        Ok(scope) => scope,
        Err(never) => match never {},
    };
    match scope {
        RoleScope::Only(ref roles) if roles.is_empty() => Err(AppError::Config(format!(
            "{} must name at least one role or `*`",
            key
        ))),
        scope => Ok(scope),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a number", key)))
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    parse_number::<u64>(key, raw).map(Duration::from_millis)
}

/// `unbounded` (or `none`) disables the limit; zero is rejected.
fn parse_limit(key: &str, raw: &str) -> Result<Option<usize>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unbounded") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match parse_number::<usize>(key, raw)? {
        0 => Err(AppError::Config(format!("{} must be positive", key))),
        limit => Ok(Some(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_match_appointment_rules() {
        let config = config_from(&[
            ("NOTIFIER_VIEWER_ID", "doc1"),
            ("NOTIFIER_VIEWER_ROLE", "doctor"),
        ])
        .unwrap();

        assert_eq!(config.viewer, ViewerContext::new("doc1", Role::Doctor));
        assert_eq!(config.classifier, ClassifierConfig::appointments());
        assert_eq!(config.queue.display_duration, Duration::from_millis(5000));
        assert_eq!(config.queue.capacity, Some(20));
        assert_eq!(config.queue.max_visible, None);
        assert_eq!(config.quiet_window, Duration::from_millis(3000));
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_viewer_is_an_error() {
        let err = config_from(&[("NOTIFIER_VIEWER_ROLE", "doctor")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("NOTIFIER_VIEWER_ID")));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("NOTIFIER_VIEWER_ID", "u1"),
            ("NOTIFIER_VIEWER_ROLE", "admin"),
            ("NOTIFIER_OWNER_FIELDS", "tickets:assignee_id, reviews:author_id"),
            ("NOTIFIER_INSERT_ROLES", "*"),
            ("NOTIFIER_DELETE_POLICY", "owner"),
            ("NOTIFIER_QUEUE_CAPACITY", "unbounded"),
            ("NOTIFIER_MAX_VISIBLE", "3"),
            ("NOTIFIER_QUIET_WINDOW_MS", "2000"),
        ])
        .unwrap();

        assert_eq!(config.viewer.role, Role::Other("admin".to_string()));
        assert_eq!(config.classifier.owner_fields["tickets"], "assignee_id");
        assert_eq!(config.classifier.owner_fields["reviews"], "author_id");
        assert_eq!(config.classifier.insert_scope, RoleScope::Any);
        assert_eq!(config.classifier.delete_policy, DeletePolicy::Owner);
        assert_eq!(config.queue.capacity, None);
        assert_eq!(config.queue.max_visible, Some(3));
        assert_eq!(config.quiet_window, Duration::from_millis(2000));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let base = [
            ("NOTIFIER_VIEWER_ID", "u1"),
            ("NOTIFIER_VIEWER_ROLE", "patient"),
        ];

        let mut pairs = base.to_vec();
        pairs.push(("NOTIFIER_OWNER_FIELDS", "appointments"));
        assert!(config_from(&pairs).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("NOTIFIER_MAX_VISIBLE", "0"));
        assert!(config_from(&pairs).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("NOTIFIER_DISPLAY_MS", "soon"));
        assert!(config_from(&pairs).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("NOTIFIER_DELETE_POLICY", "cascade"));
        assert!(config_from(&pairs).is_err());
    }

    #[test]
    fn test_empty_role_list_is_rejected() {
        for value in ["", " , "] {
            let err = config_from(&[
                ("NOTIFIER_VIEWER_ID", "doc1"),
                ("NOTIFIER_VIEWER_ROLE", "doctor"),
                ("NOTIFIER_INSERT_ROLES", value),
            ])
            .unwrap_err();
            assert!(matches!(err, AppError::Config(msg) if msg.contains("NOTIFIER_INSERT_ROLES")));
        }
    }
}
