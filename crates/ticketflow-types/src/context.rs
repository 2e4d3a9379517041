//! Run context: the identity and caller-supplied data threaded through
//! every engine invocation.
//!
//! Operation handlers may read extra attributes from the context, but the
//! only field they can rely on is the acting user.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── User Identifier ──────────────────────────────────────────────────

/// Identity of the actor driving a ticket (creator, checker, operator)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Run Context ──────────────────────────────────────────────────────

/// Context passed through every engine call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunContext {
    /// The acting user — the one guaranteed field
    pub user: UserId,
    /// Caller-supplied attributes; handlers must not assume any shape here
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, String>,
}

impl RunContext {
    /// Create a context for an acting user
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Look up a caller-supplied attribute
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}
