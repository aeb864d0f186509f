use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Doctor,
    Patient,
    Other(String),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
            Role::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Role::Doctor,
            "patient" => Role::Patient,
            other => Role::Other(other.to_string()),
        };
        Ok(role)
    }
}

/// Who is looking at the page. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    pub identity: String,
    pub role: Role,
}

impl ViewerContext {
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
        }
    }
}

/// Per-session state handed to every component constructor.
#[derive(Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub viewer: ViewerContext,
    pub clock: Arc<dyn Clock>,
}

impl SessionContext {
    pub fn new(viewer: ViewerContext) -> Self {
        Self::with_clock(viewer, Arc::new(SystemClock))
    }

    pub fn with_clock(viewer: ViewerContext, clock: Arc<dyn Clock>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            viewer,
            clock,
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("viewer", &self.viewer)
            .finish_non_exhaustive()
    }
}
