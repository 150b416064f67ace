//! Word bank core library
//!
//! A trigger/response store for chat bots. Administrators author rules that
//! map a trigger (exact text, substring or regex) to one or more reply
//! templates, scoped either globally or to one conversation. Incoming
//! messages are matched against the bank and a reply is rendered, with image
//! attachments loaded from the media store.
//!
//! ## Key Components
//!
//! - `RuleStore`: persistent, layered rule bank
//! - `matcher`: strategy precedence and global/conversation layering
//! - `MediaStore`: attachment bytes by file name
//! - `TemplateRenderer`: reply templates to outbound message segments
//! - `Responder`: the end-to-end inbound message flow

pub mod authoring;
pub mod config;
pub mod cq;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod matcher;
pub mod media;
pub mod metrics;
pub mod obs;
pub mod responder;
pub mod store;
pub mod telemetry;
pub mod template;

pub use authoring::{normalize_trigger, Authoring, RuleDraft, SetCommand};
pub use config::{ReplyMode, WordBankConfig};
pub use domain::{ClearTarget, Conversation, Scope, Strategy, GLOBAL_SCOPE_ID};
pub use error::{Result, WordBankError};
pub use matcher::{PatternCache, RuleMatch, MENTION_PREFIX};
pub use media::fs::FsMediaStore;
pub use media::http::HttpFetcher;
pub use media::{InlineMedia, MediaError, MediaResult, MediaStore, RemoteFetch};
pub use responder::{InboundMessage, ModerationAction, OutboundSink, Responder};
pub use store::{BankDocument, RuleStore};
pub use telemetry::init_tracing;
pub use template::{OutboundMessage, RenderContext, Segment, TemplateRenderer};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
