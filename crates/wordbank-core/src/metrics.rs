//! Global atomic counters for word bank activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. on shutdown).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters; no allocations, no locking.
pub struct Metrics {
    messages_handled: AtomicU64,
    messages_matched: AtomicU64,
    rules_written: AtomicU64,
    media_saved: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            messages_handled: AtomicU64::new(0),
            messages_matched: AtomicU64::new(0),
            rules_written: AtomicU64::new(0),
            media_saved: AtomicU64::new(0),
        }
    }

    pub fn inc_messages_handled(&self) {
        self.messages_handled.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "messages_handled", "counter incremented");
    }

    pub fn inc_messages_matched(&self) {
        self.messages_matched.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "messages_matched", "counter incremented");
    }

    /// Counts set, delete and clear alike.
    pub fn inc_rules_written(&self) {
        self.rules_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "rules_written", "counter incremented");
    }

    pub fn inc_media_saved(&self) {
        self.media_saved.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "media_saved", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            messages_handled = self.messages_handled(),
            messages_matched = self.messages_matched(),
            rules_written = self.rules_written(),
            media_saved = self.media_saved(),
        );
    }

    pub fn messages_handled(&self) -> u64 {
        self.messages_handled.load(Ordering::Relaxed)
    }

    pub fn messages_matched(&self) -> u64 {
        self.messages_matched.load(Ordering::Relaxed)
    }

    pub fn rules_written(&self) -> u64 {
        self.rules_written.load(Ordering::Relaxed)
    }

    pub fn media_saved(&self) -> u64 {
        self.media_saved.load(Ordering::Relaxed)
    }
}
