//! Structured observability hooks for word bank lifecycle events.
//!
//! This module provides:
//! - A conversation-scoped span for message handling
//! - Emission functions for bank load, rule mutation, matching and media ingest
//!
//! Events are emitted at `info!` level unless noted; filter with `RUST_LOG`.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::{Scope, Strategy};

/// Span covering the handling of one inbound message in `scope`.
///
/// Attach it to the handling future with `tracing::Instrument`.
pub fn message_span(scope: &Scope) -> tracing::Span {
    tracing::info_span!("wordbank.message", scope = %scope)
}

/// Emit event: an existing bank document was read.
pub fn emit_bank_loaded(path: &Path, rules: usize) {
    info!(event = "bank.loaded", path = %path.display(), rules = rules);
}

/// Emit event: no bank document existed and a fresh one was written.
pub fn emit_bank_created(path: &Path) {
    info!(event = "bank.created", path = %path.display());
}

pub fn emit_rule_set(scope: &Scope, strategy: Strategy, trigger: &str, replies: usize) {
    info!(
        event = "rule.set",
        scope = %scope,
        strategy = %strategy,
        trigger = %trigger,
        replies = replies,
    );
}

pub fn emit_rule_deleted(scope: &Scope, strategy: Strategy, trigger: &str, existed: bool) {
    info!(
        event = "rule.deleted",
        scope = %scope,
        strategy = %strategy,
        trigger = %trigger,
        existed = existed,
    );
}

/// Emit event: a scope, or the whole bank when `scope` is `None`, was cleared.
pub fn emit_bank_cleared(scope: Option<&Scope>) {
    match scope {
        Some(scope) => info!(event = "bank.cleared", scope = %scope),
        None => info!(event = "bank.cleared", scope = "*"),
    }
}

pub fn emit_rule_matched(scope: &Scope, strategy: Strategy, trigger: &str) {
    info!(
        event = "rule.matched",
        scope = %scope,
        strategy = %strategy,
        trigger = %trigger,
    );
}

/// Emit event: a regex trigger failed to compile and was skipped (warning level).
pub fn emit_invalid_pattern(pattern: &str, error: &dyn std::fmt::Display) {
    warn!(event = "rule.invalid_pattern", pattern = %pattern, error = %error);
}

pub fn emit_media_saved(name: &str, bytes: usize) {
    info!(event = "media.saved", name = %name, bytes = bytes);
}

/// Emit event: a mute request failed; the reply is still sent (warning level).
pub fn emit_moderation_failed(scope: &Scope, user_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "moderation.failed",
        scope = %scope,
        user_id = %user_id,
        error = %error,
    );
}
