//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryMediaStore`, `StaticFetcher`, `RecordingModeration` and
//! `CollectingSink` so the responder and authoring flows can run without a
//! filesystem, network or chat platform.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Conversation, Scope};
use crate::error::{Result, WordBankError};
use crate::media::{validate_name, MediaError, MediaResult, MediaStore, RemoteFetch};
use crate::responder::{ModerationAction, OutboundSink};
use crate::template::OutboundMessage;

// ---------------------------------------------------------------------------
// MemoryMediaStore
// ---------------------------------------------------------------------------

/// Media store backed by a `HashMap<name, bytes>`.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without going through the async trait.
    pub fn insert(&self, name: &str, data: &[u8]) {
        let mut files = self.files.lock().unwrap();
        files.insert(name.to_string(), data.to_vec());
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn save(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        validate_name(name)?;
        self.insert(name, data);
        Ok(())
    }

    async fn load(&self, name: &str) -> MediaResult<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files.get(name).cloned().ok_or_else(|| MediaError::NotFound {
            name: name.to_string(),
        })
    }

    async fn contains(&self, name: &str) -> MediaResult<bool> {
        let files = self.files.lock().unwrap();
        Ok(files.contains_key(name))
    }
}

// ---------------------------------------------------------------------------
// StaticFetcher
// ---------------------------------------------------------------------------

/// Remote fetcher answering from a fixed URL table. Unknown URLs fail.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, data: Vec<u8>) -> Self {
        self.responses.insert(url.into(), data);
        self
    }
}

#[async_trait]
impl RemoteFetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> MediaResult<Vec<u8>> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| MediaError::Fetch(format!("no response for {url}")))
    }
}

// ---------------------------------------------------------------------------
// RecordingModeration
// ---------------------------------------------------------------------------

/// Records every mute request; optionally fails each one after recording it.
#[derive(Debug, Default)]
pub struct RecordingModeration {
    calls: Mutex<Vec<(Scope, String, Duration)>>,
    fail: bool,
}

impl RecordingModeration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Scope, String, Duration)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerationAction for RecordingModeration {
    async fn mute(&self, scope: &Scope, user_id: &str, duration: Duration) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((scope.clone(), user_id.to_string(), duration));
        if self.fail {
            return Err(WordBankError::Moderation(format!(
                "not permitted to mute {user_id} in {scope}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CollectingSink
// ---------------------------------------------------------------------------

/// Outbound sink that keeps every delivered message, or rejects them all.
#[derive(Debug, Default)]
pub struct CollectingSink {
    sent: Mutex<Vec<(Conversation, OutboundMessage)>>,
    reject: bool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(Conversation, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutboundSink for CollectingSink {
    async fn send(&self, conversation: &Conversation, message: OutboundMessage) -> Result<()> {
        if self.reject {
            return Err(WordBankError::Delivery(format!(
                "{:?} is not reachable",
                conversation
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((conversation.clone(), message));
        Ok(())
    }
}
