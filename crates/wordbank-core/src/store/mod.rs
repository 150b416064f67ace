//! Persistent rule store.
//!
//! The store exclusively owns the in-memory [`BankDocument`]. Every mutation
//! takes the write lock, applies the change to a copy and rewrites the whole
//! file from that copy; the copy replaces the live document only once the
//! write succeeded. Writers are serialized, readers never observe a
//! half-applied change, and a failed write leaves memory matching disk.
//! Writes go to a temp file in the bank directory that is then renamed over
//! the bank file.

pub mod document;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::WordBankConfig;
use crate::domain::{ClearTarget, Scope, Strategy};
use crate::error::{Result, WordBankError};
use crate::matcher::{self, PatternCache, RuleMatch};
use crate::metrics::METRICS;
use crate::obs;

pub use document::{BankDocument, ScopeMap, TriggerMap};

pub struct RuleStore {
    path: PathBuf,
    doc: RwLock<BankDocument>,
    patterns: PatternCache,
}

impl RuleStore {
    /// Open the bank at `path`.
    ///
    /// A missing file is created with three empty strategy sections. A file
    /// that is not a valid bank document fails the open; missing sections
    /// default to empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = if path.is_file() {
            let raw = std::fs::read_to_string(&path)?;
            let doc = BankDocument::from_json(&raw)?;
            obs::emit_bank_loaded(&path, doc.rule_count());
            RuleStore {
                path,
                doc: RwLock::new(doc),
                patterns: PatternCache::new(),
            }
        } else {
            let store = RuleStore {
                path,
                doc: RwLock::new(BankDocument::empty()),
                patterns: PatternCache::new(),
            };
            store.persist(&store.read_doc())?;
            obs::emit_bank_created(&store.path);
            store
        };
        Ok(store)
    }

    pub fn open_with_config(config: &WordBankConfig) -> Result<Self> {
        Self::open(config.bank_path())
    }

    /// Flush the document one last time and release the store.
    pub fn close(self) -> Result<()> {
        let doc = self.doc.into_inner().unwrap_or_else(PoisonError::into_inner);
        write_atomically(&self.path, &doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `reply` to the trigger's reply list, creating it if needed.
    ///
    /// Identical replies are kept as duplicates. Returns the number of
    /// replies now stored under the trigger.
    pub fn set(&self, scope: &Scope, trigger: &str, reply: &str, strategy: Strategy) -> Result<usize> {
        let mut doc = self.write_doc();
        let mut next = doc.clone();
        let count = next.push_reply(strategy, scope, trigger, reply);
        self.persist(&next)?;
        *doc = next;
        METRICS.inc_rules_written();
        obs::emit_rule_set(scope, strategy, trigger, count);
        Ok(count)
    }

    /// Remove a trigger and all of its replies.
    ///
    /// A missing trigger is not an error. Returns whether the trigger existed.
    pub fn delete(&self, scope: &Scope, trigger: &str, strategy: Strategy) -> Result<bool> {
        let mut doc = self.write_doc();
        let mut next = doc.clone();
        let existed = next.remove_trigger(strategy, scope, trigger);
        self.persist(&next)?;
        *doc = next;
        if existed && strategy == Strategy::Regex {
            self.patterns.forget(trigger);
        }
        METRICS.inc_rules_written();
        obs::emit_rule_deleted(scope, strategy, trigger, existed);
        Ok(existed)
    }

    /// Reset the whole bank, or drop one scope from every strategy.
    ///
    /// Clearing the global scope leaves conversation scopes untouched.
    pub fn clear(&self, target: impl Into<ClearTarget>) -> Result<()> {
        let target = target.into();
        let mut doc = self.write_doc();
        let next = match &target {
            ClearTarget::All => BankDocument::empty(),
            ClearTarget::Scope(scope) => {
                let mut next = doc.clone();
                next.remove_scope(scope);
                next
            }
        };
        self.persist(&next)?;
        *doc = next;
        self.patterns.clear();
        METRICS.inc_rules_written();
        match &target {
            ClearTarget::All => obs::emit_bank_cleared(None),
            ClearTarget::Scope(scope) => obs::emit_bank_cleared(Some(scope)),
        }
        Ok(())
    }

    /// Reply list of the first rule matching `message`, or `None`.
    pub fn match_message(
        &self,
        scope: &Scope,
        message: &str,
        to_me: bool,
        strategy: Option<Strategy>,
    ) -> Option<Vec<String>> {
        self.find(scope, message, to_me, strategy).map(|m| m.replies)
    }

    /// Like [`match_message`](Self::match_message) but reports which rule fired.
    pub fn find(
        &self,
        scope: &Scope,
        message: &str,
        to_me: bool,
        strategy: Option<Strategy>,
    ) -> Option<RuleMatch> {
        let doc = self.read_doc();
        let found = matcher::find(&doc, &self.patterns, scope, message, to_me, strategy);
        if let Some(m) = &found {
            obs::emit_rule_matched(scope, m.strategy, &m.trigger);
        }
        found
    }

    /// Replies stored directly under `(strategy, scope, trigger)`, without layering.
    pub fn replies(&self, scope: &Scope, trigger: &str, strategy: Strategy) -> Option<Vec<String>> {
        self.read_doc()
            .triggers(strategy, scope)
            .and_then(|t| t.get(trigger))
            .cloned()
    }

    /// Triggers stored in one scope for one strategy, in insertion order.
    pub fn triggers(&self, scope: &Scope, strategy: Strategy) -> Vec<String> {
        self.read_doc()
            .triggers(strategy, scope)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> BankDocument {
        self.read_doc().clone()
    }

    fn read_doc(&self) -> RwLockReadGuard<'_, BankDocument> {
        self.doc.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_doc(&self) -> RwLockWriteGuard<'_, BankDocument> {
        self.doc.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, doc: &BankDocument) -> Result<()> {
        write_atomically(&self.path, doc)
    }
}

fn write_atomically(path: &Path, doc: &BankDocument) -> Result<()> {
    let json = doc.to_json_pretty()?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| WordBankError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;

    debug!(path = %path.display(), bytes = json.len(), "bank persisted");
    Ok(())
}
