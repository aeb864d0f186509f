use std::collections::HashMap;
use std::str::FromStr;

use crate::session::Role;

/// Outcome of classifying one change event for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelevanceDecision {
    Ignore,
    Notify {
        message: String,
        entity_id: Option<String>,
    },
}

impl RelevanceDecision {
    pub fn is_notify(&self) -> bool {
        matches!(self, RelevanceDecision::Notify { .. })
    }
}

/// Which viewer roles a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleScope {
    Any,
    Only(Vec<Role>),
}

impl RoleScope {
    pub fn allows(&self, role: &Role) -> bool {
        match self {
            RoleScope::Any => true,
            RoleScope::Only(roles) => roles.contains(role),
        }
    }
}

impl FromStr for RoleScope {
    type Err = std::convert::Infallible;

    /// `*` or `any` means every role; otherwise a comma separated role list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "*" || trimmed.eq_ignore_ascii_case("any") {
            return Ok(RoleScope::Any);
        }
        let roles = trimmed
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();
        Ok(RoleScope::Only(roles))
    }
}

/// What to do with delete events. The change feed gives no obvious answer,
/// so integrators pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    #[default]
    Ignore,
    /// Notify when the removed row's owner field names the viewer.
    Owner,
    /// Notify when the removed row's subject field names the viewer.
    Subject,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(DeletePolicy::Ignore),
            "owner" => Ok(DeletePolicy::Owner),
            "subject" => Ok(DeletePolicy::Subject),
            other => Err(format!("unknown delete policy `{}`", other)),
        }
    }
}

/// Toast texts. `{table}` is the raw table name, `{entity}` the singular
/// capitalised form and `{status}` the new status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplates {
    pub insert: String,
    pub update: String,
    pub delete: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            insert: "New {table} request received".to_string(),
            update: "{entity} status updated to: {status}".to_string(),
            delete: "{entity} removed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// table -> field holding the id of the row's owner (checked on insert)
    pub owner_fields: HashMap<String, String>,
    /// table -> field holding the id of the affected party (checked on update)
    pub subject_fields: HashMap<String, String>,
    pub status_field: String,
    pub id_field: String,
    pub insert_scope: RoleScope,
    pub update_scope: RoleScope,
    pub delete_scope: RoleScope,
    pub delete_policy: DeletePolicy,
    pub templates: MessageTemplates,
}

impl ClassifierConfig {
    /// Empty rule set: every table is unknown until fields are mapped.
    pub fn new(status_field: impl Into<String>) -> Self {
        Self {
            owner_fields: HashMap::new(),
            subject_fields: HashMap::new(),
            status_field: status_field.into(),
            id_field: "id".to_string(),
            insert_scope: RoleScope::Any,
            update_scope: RoleScope::Any,
            delete_scope: RoleScope::Any,
            delete_policy: DeletePolicy::Ignore,
            templates: MessageTemplates::default(),
        }
    }

    /// Role-aware appointment rules: doctors hear about new requests
    /// assigned to them, patients about status changes on their bookings.
    pub fn appointments() -> Self {
        Self::new("status")
            .with_owner_field("appointments", "doctor_id")
            .with_subject_field("appointments", "patient_id")
            .with_insert_scope(RoleScope::Only(vec![Role::Doctor]))
            .with_update_scope(RoleScope::Only(vec![Role::Patient]))
    }

    pub fn with_owner_field(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.owner_fields.insert(table.into(), field.into());
        self
    }

    pub fn with_subject_field(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.subject_fields.insert(table.into(), field.into());
        self
    }

    pub fn with_insert_scope(mut self, scope: RoleScope) -> Self {
        self.insert_scope = scope;
        self
    }

    pub fn with_update_scope(mut self, scope: RoleScope) -> Self {
        self.update_scope = scope;
        self
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy, scope: RoleScope) -> Self {
        self.delete_policy = policy;
        self.delete_scope = scope;
        self
    }

    pub fn knows_table(&self, table: &str) -> bool {
        self.owner_fields.contains_key(table) || self.subject_fields.contains_key(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_scope_parsing() {
        assert_eq!("*".parse::<RoleScope>().unwrap(), RoleScope::Any);
        assert_eq!("ANY".parse::<RoleScope>().unwrap(), RoleScope::Any);
        assert_eq!(
            "doctor, patient".parse::<RoleScope>().unwrap(),
            RoleScope::Only(vec![Role::Doctor, Role::Patient])
        );
    }

    #[test]
    fn test_role_scope_allows() {
        let scope = RoleScope::Only(vec![Role::Doctor]);
        assert!(scope.allows(&Role::Doctor));
        assert!(!scope.allows(&Role::Patient));
        assert!(RoleScope::Any.allows(&Role::Other("admin".to_string())));
    }

    #[test]
    fn test_delete_policy_parsing() {
        assert_eq!("ignore".parse::<DeletePolicy>(), Ok(DeletePolicy::Ignore));
        assert_eq!("Owner".parse::<DeletePolicy>(), Ok(DeletePolicy::Owner));
        assert_eq!("subject".parse::<DeletePolicy>(), Ok(DeletePolicy::Subject));
        assert!("cascade".parse::<DeletePolicy>().is_err());
    }

    #[test]
    fn test_appointments_preset() {
        let config = ClassifierConfig::appointments();
        assert!(config.knows_table("appointments"));
        assert!(!config.knows_table("profiles"));
        assert_eq!(config.owner_fields["appointments"], "doctor_id");
        assert_eq!(config.subject_fields["appointments"], "patient_id");
        assert_eq!(config.delete_policy, DeletePolicy::Ignore);
    }
}
