//! Persisted shape of the bank.
//!
//! ```json
//! {
//!     "exact":     { "<scope id>": { "<trigger>": ["<reply>", ...] } },
//!     "substring": { ... },
//!     "regex":     { ... }
//! }
//! ```
//!
//! Maps preserve insertion order; the matcher relies on it for substring and
//! regex precedence.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Scope, Strategy, GLOBAL_SCOPE_ID};
use crate::error::Result;

/// Trigger text to its ordered reply templates.
pub type TriggerMap = IndexMap<String, Vec<String>>;

/// Scope id to that scope's triggers.
pub type ScopeMap = IndexMap<String, TriggerMap>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDocument {
    #[serde(default, alias = "congruence", deserialize_with = "null_as_empty")]
    pub exact: ScopeMap,
    #[serde(default, alias = "include", deserialize_with = "null_as_empty")]
    pub substring: ScopeMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub regex: ScopeMap,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<ScopeMap, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<ScopeMap>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Default for BankDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl BankDocument {
    /// Three strategy sections, each holding an empty global scope.
    pub fn empty() -> Self {
        let seeded = || {
            let mut map = ScopeMap::new();
            map.insert(GLOBAL_SCOPE_ID.to_string(), TriggerMap::new());
            map
        };
        BankDocument {
            exact: seeded(),
            substring: seeded(),
            regex: seeded(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Pretty JSON with four-space indentation. Non-ASCII text is written as-is.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn section(&self, strategy: Strategy) -> &ScopeMap {
        match strategy {
            Strategy::Exact => &self.exact,
            Strategy::Substring => &self.substring,
            Strategy::Regex => &self.regex,
        }
    }

    pub fn section_mut(&mut self, strategy: Strategy) -> &mut ScopeMap {
        match strategy {
            Strategy::Exact => &mut self.exact,
            Strategy::Substring => &mut self.substring,
            Strategy::Regex => &mut self.regex,
        }
    }

    pub fn triggers(&self, strategy: Strategy, scope: &Scope) -> Option<&TriggerMap> {
        self.section(strategy).get(scope.as_str())
    }

    /// Append `reply` under `(strategy, scope, trigger)`, creating maps as needed.
    /// Returns the number of replies now stored for the trigger.
    pub fn push_reply(
        &mut self,
        strategy: Strategy,
        scope: &Scope,
        trigger: &str,
        reply: &str,
    ) -> usize {
        let replies = self
            .section_mut(strategy)
            .entry(scope.as_str().to_string())
            .or_default()
            .entry(trigger.to_string())
            .or_default();
        replies.push(reply.to_string());
        replies.len()
    }

    /// Remove a trigger with all its replies. Returns whether it existed.
    pub fn remove_trigger(&mut self, strategy: Strategy, scope: &Scope, trigger: &str) -> bool {
        self.section_mut(strategy)
            .get_mut(scope.as_str())
            .and_then(|triggers| triggers.shift_remove(trigger))
            .is_some()
    }

    /// Remove a scope from every strategy. Returns whether any section held it.
    pub fn remove_scope(&mut self, scope: &Scope) -> bool {
        let mut removed = false;
        for strategy in Strategy::ALL {
            removed |= self
                .section_mut(strategy)
                .shift_remove(scope.as_str())
                .is_some();
        }
        removed
    }

    /// Total number of triggers across all strategies and scopes.
    pub fn rule_count(&self) -> usize {
        Strategy::ALL
            .iter()
            .flat_map(|s| self.section(*s).values())
            .map(|triggers| triggers.len())
            .sum()
    }
}
