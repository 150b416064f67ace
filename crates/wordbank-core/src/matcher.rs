//! Trigger matching across strategies and scope layers.
//!
//! For each strategy the conversation layer is consulted before the global
//! layer. On a trigger collision the conversation entry wins; global entries
//! with new triggers follow the conversation's own, in insertion order.
//!
//! A message that addressed the bot is also tried with the [`MENTION_PREFIX`]
//! prepended, so mention-only triggers are reachable only in mention context.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use regex::{Regex, RegexBuilder};

use crate::domain::{Scope, Strategy};
use crate::obs;
use crate::store::document::{BankDocument, TriggerMap};

/// Prefix marking a trigger that only fires when the bot is mentioned.
pub const MENTION_PREFIX: &str = "/atme ";

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub strategy: Strategy,
    pub trigger: String,
    pub replies: Vec<String>,
}

/// Compiled regex triggers keyed by trigger text.
///
/// Only patterns that compile are kept; an invalid trigger is recompiled and
/// reported each time it is reached.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled form of `pattern`, or `None` if it does not compile.
    pub fn get(&self, pattern: &str) -> Option<Regex> {
        if let Some(re) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return Some(re.clone());
        }

        match RegexBuilder::new(pattern).dot_matches_new_line(true).build() {
            Ok(re) => {
                self.compiled
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(pattern.to_string(), re.clone());
                Some(re)
            }
            Err(e) => {
                obs::emit_invalid_pattern(pattern, &e);
                None
            }
        }
    }

    pub fn forget(&self, pattern: &str) {
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(pattern);
    }

    pub fn clear(&self) {
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Find the first rule matching `message` in `scope`.
///
/// With `strategy == None` the strategies are tried in [`Strategy::ALL`] order
/// and the first hit wins; results are never merged across strategies.
pub fn find(
    doc: &BankDocument,
    patterns: &PatternCache,
    scope: &Scope,
    message: &str,
    to_me: bool,
    strategy: Option<Strategy>,
) -> Option<RuleMatch> {
    match strategy {
        Some(strategy) => find_with(doc, patterns, scope, message, to_me, strategy),
        None => Strategy::ALL
            .into_iter()
            .find_map(|strategy| find_with(doc, patterns, scope, message, to_me, strategy)),
    }
}

fn find_with(
    doc: &BankDocument,
    patterns: &PatternCache,
    scope: &Scope,
    message: &str,
    to_me: bool,
    strategy: Strategy,
) -> Option<RuleMatch> {
    let layers = Layers::new(doc, strategy, scope);
    let mentioned = to_me.then(|| format!("{MENTION_PREFIX}{message}"));

    let (trigger, replies) = match strategy {
        Strategy::Exact => mentioned
            .as_deref()
            .and_then(|m| layers.get(m))
            .or_else(|| layers.get(message))?,
        Strategy::Substring => layers.iter().find(|(trigger, _)| {
            mentioned.as_deref().is_some_and(|m| m.contains(trigger)) || message.contains(trigger)
        })?,
        Strategy::Regex => layers.iter().find(|(trigger, _)| {
            let Some(re) = patterns.get(trigger) else {
                return false;
            };
            mentioned.as_deref().is_some_and(|m| re.is_match(m)) || re.is_match(message)
        })?,
    };

    Some(RuleMatch {
        strategy,
        trigger: trigger.to_string(),
        replies: replies.to_vec(),
    })
}

/// Conversation layer stacked over the global layer for one strategy.
struct Layers<'a> {
    local: Option<&'a TriggerMap>,
    global: Option<&'a TriggerMap>,
}

impl<'a> Layers<'a> {
    fn new(doc: &'a BankDocument, strategy: Strategy, scope: &Scope) -> Self {
        let global = doc.triggers(strategy, &Scope::global());
        let local = if scope.is_global() {
            None
        } else {
            doc.triggers(strategy, scope)
        };
        Layers { local, global }
    }

    /// An empty reply list in the conversation layer does not hide the global entry.
    fn get(&self, trigger: &str) -> Option<(&'a str, &'a [String])> {
        [self.local, self.global]
            .into_iter()
            .flatten()
            .find_map(|map| {
                map.get_key_value(trigger)
                    .filter(|(_, replies)| !replies.is_empty())
            })
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Merged iteration: local entries first, then global entries not shadowed by them.
    fn iter(&self) -> impl Iterator<Item = (&'a str, &'a [String])> + '_ {
        let local = self.local.into_iter().flatten();
        let global = self
            .global
            .into_iter()
            .flatten()
            .filter(|(trigger, _)| !self.local.is_some_and(|l| l.contains_key(trigger.as_str())));
        local
            .chain(global)
            .filter(|(_, replies)| !replies.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(
        doc: &BankDocument,
        scope: &Scope,
        message: &str,
        to_me: bool,
        strategy: Option<Strategy>,
    ) -> Option<RuleMatch> {
        find(doc, &PatternCache::new(), scope, message, to_me, strategy)
    }

    fn doc_with(entries: &[(Strategy, &str, &str, &str)]) -> BankDocument {
        let mut doc = BankDocument::empty();
        for (strategy, scope, trigger, reply) in entries {
            doc.push_reply(*strategy, &Scope::new(*scope), trigger, reply);
        }
        doc
    }

    #[test]
    fn test_exact_match() {
        let doc = doc_with(&[(Strategy::Exact, "0", "ping", "pong")]);
        let m = lookup(&doc, &Scope::new("1"), "ping", false, None).unwrap();
        assert_eq!(m.strategy, Strategy::Exact);
        assert_eq!(m.replies, vec!["pong".to_string()]);
        assert!(lookup(&doc, &Scope::new("1"), "ping!", false, Some(Strategy::Exact)).is_none());
    }

    #[test]
    fn test_conversation_layer_shadows_global() {
        let doc = doc_with(&[
            (Strategy::Exact, "0", "hi", "global"),
            (Strategy::Exact, "7", "hi", "local"),
        ]);
        let m = lookup(&doc, &Scope::new("7"), "hi", false, None).unwrap();
        assert_eq!(m.replies, vec!["local".to_string()]);

        let other = lookup(&doc, &Scope::new("8"), "hi", false, None).unwrap();
        assert_eq!(other.replies, vec!["global".to_string()]);
    }

    #[test]
    fn test_substring_iterates_local_before_global() {
        let doc = doc_with(&[
            (Strategy::Substring, "0", "hello", "global-hello"),
            (Strategy::Substring, "5", "world", "local-world"),
        ]);
        let m = lookup(&doc, &Scope::new("5"), "hello world", false, None).unwrap();
        assert_eq!(m.trigger, "world");

        let g = lookup(&doc, &Scope::new("6"), "hello world", false, None).unwrap();
        assert_eq!(g.trigger, "hello");
        assert!(lookup(&doc, &Scope::new("6"), "xyz", false, None).is_none());
    }

    #[test]
    fn test_strategy_order_exact_first() {
        let doc = doc_with(&[
            (Strategy::Substring, "0", "hi", "sub"),
            (Strategy::Exact, "0", "hi", "exact"),
            (Strategy::Regex, "0", "h.", "re"),
        ]);
        let m = lookup(&doc, &Scope::new("1"), "hi", false, None).unwrap();
        assert_eq!(m.replies, vec!["exact".to_string()]);

        let m = lookup(&doc, &Scope::new("1"), "oh hi", false, None).unwrap();
        assert_eq!(m.replies, vec!["sub".to_string()]);

        let m = lookup(&doc, &Scope::new("1"), "ho", false, None).unwrap();
        assert_eq!(m.replies, vec!["re".to_string()]);
    }

    #[test]
    fn test_mention_only_trigger_requires_to_me() {
        let doc = doc_with(&[(Strategy::Exact, "0", "/atme hi", "hey you")]);
        assert!(lookup(&doc, &Scope::new("1"), "hi", false, None).is_none());
        let m = lookup(&doc, &Scope::new("1"), "hi", true, None).unwrap();
        assert_eq!(m.trigger, "/atme hi");
    }

    #[test]
    fn test_mention_variant_preferred_for_exact() {
        let doc = doc_with(&[
            (Strategy::Exact, "0", "hi", "plain"),
            (Strategy::Exact, "0", "/atme hi", "mentioned"),
        ]);
        let m = lookup(&doc, &Scope::new("1"), "hi", true, None).unwrap();
        assert_eq!(m.replies, vec!["mentioned".to_string()]);
        let m = lookup(&doc, &Scope::new("1"), "hi", false, None).unwrap();
        assert_eq!(m.replies, vec!["plain".to_string()]);
    }

    #[test]
    fn test_regex_dot_matches_newline() {
        let doc = doc_with(&[(Strategy::Regex, "0", "^a.b$", "yes")]);
        assert!(lookup(&doc, &Scope::new("1"), "a\nb", false, None).is_some());
    }

    #[test]
    fn test_invalid_regex_is_skipped() {
        let doc = doc_with(&[
            (Strategy::Regex, "3", "([unclosed", "broken"),
            (Strategy::Regex, "3", r"\d{3}", "digits"),
        ]);
        let m = lookup(&doc, &Scope::new("3"), "call 911", false, Some(Strategy::Regex)).unwrap();
        assert_eq!(m.replies, vec!["digits".to_string()]);
    }

    #[test]
    fn test_unicode_class_repetition_matches() {
        let doc = doc_with(&[(Strategy::Regex, "4", r"\w{60}", "long word")]);
        let m = find(
            &doc,
            &PatternCache::new(),
            &Scope::new("4"),
            &"a".repeat(60),
            false,
            Some(Strategy::Regex),
        )
        .unwrap();
        assert_eq!(m.replies, vec!["long word".to_string()]);
    }

    #[test]
    fn test_pattern_cache_keeps_valid_patterns_only() {
        let cache = PatternCache::new();
        assert!(cache.get("^a+$").is_some());
        assert!(cache.get("^a+$").is_some());
        assert!(cache.get("([").is_none());
        assert_eq!(cache.len(), 1);

        cache.forget("^a+$");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_local_entry_falls_through_to_global() {
        let mut doc = doc_with(&[(Strategy::Exact, "0", "hi", "global")]);
        doc.section_mut(Strategy::Exact)
            .entry("9".to_string())
            .or_default()
            .insert("hi".to_string(), Vec::new());
        let m = lookup(&doc, &Scope::new("9"), "hi", false, None).unwrap();
        assert_eq!(m.replies, vec!["global".to_string()]);
    }

    #[test]
    fn test_global_scope_lookup_uses_global_layer_only() {
        let doc = doc_with(&[(Strategy::Exact, "0", "a", "g")]);
        let m = lookup(&doc, &Scope::global(), "a", false, None).unwrap();
        assert_eq!(m.replies, vec!["g".to_string()]);
    }
}
