use serde::{Deserialize, Serialize};

/// Reserved scope id for the global layer. Real conversation ids are never `"0"`.
pub const GLOBAL_SCOPE_ID: &str = "0";

/// Namespace a rule belongs to: the global layer or one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub fn new(id: impl Into<String>) -> Self {
        Scope(id.into())
    }

    /// The global layer, consulted for every conversation.
    pub fn global() -> Self {
        Scope(GLOBAL_SCOPE_ID.to_string())
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_SCOPE_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Scope {
    fn from(id: &str) -> Self {
        Scope::new(id)
    }
}

impl From<String> for Scope {
    fn from(id: String) -> Self {
        Scope(id)
    }
}

/// Where an inbound message came from.
///
/// Group conversations are multi-party and allow moderation actions;
/// private conversations are one-to-one and never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Conversation {
    Group(String),
    Private(String),
}

impl Conversation {
    /// Scope used for rule lookup: the group id, or the private correspondent's id.
    pub fn scope(&self) -> Scope {
        match self {
            Self::Group(id) | Self::Private(id) => Scope::new(id.clone()),
        }
    }

    pub fn is_multi_party(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// Target of a clear operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    /// Reset the entire bank.
    All,
    /// Remove one scope's rules from every strategy.
    Scope(Scope),
}

impl From<Scope> for ClearTarget {
    fn from(scope: Scope) -> Self {
        ClearTarget::Scope(scope)
    }
}
