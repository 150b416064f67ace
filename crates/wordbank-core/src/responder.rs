//! Inbound message handling: match, pick a reply, moderate, render.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};

use crate::config::ReplyMode;
use crate::cq;
use crate::domain::{Conversation, Scope};
use crate::error::Result;
use crate::metrics::METRICS;
use crate::obs;
use crate::store::RuleStore;
use crate::template::{extract_mute, OutboundMessage, RenderContext, TemplateRenderer};

/// One chat message as delivered by the platform adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub conversation: Conversation,
    /// Raw message text, CQ-escaped as received
    pub text: String,
    /// Whether the message addressed the bot directly
    pub to_me: bool,
    pub sender_name: String,
    pub sender_id: String,
}

/// Mutes a member of a multi-party conversation.
#[async_trait]
pub trait ModerationAction: Send + Sync {
    async fn mute(&self, scope: &Scope, user_id: &str, duration: Duration) -> Result<()>;
}

/// Delivers rendered replies back to the platform.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    async fn send(&self, conversation: &Conversation, message: OutboundMessage) -> Result<()>;
}

pub struct Responder {
    store: Arc<RuleStore>,
    renderer: TemplateRenderer,
    moderation: Option<Arc<dyn ModerationAction>>,
    reply_mode: ReplyMode,
}

impl Responder {
    pub fn new(store: Arc<RuleStore>, renderer: TemplateRenderer) -> Self {
        Self {
            store,
            renderer,
            moderation: None,
            reply_mode: ReplyMode::default(),
        }
    }

    pub fn with_moderation(mut self, moderation: Arc<dyn ModerationAction>) -> Self {
        self.moderation = Some(moderation);
        self
    }

    pub fn with_reply_mode(mut self, mode: ReplyMode) -> Self {
        self.reply_mode = mode;
        self
    }

    /// Produce the reply for `inbound`, or `None` when no rule matches.
    ///
    /// A mute directive in the chosen reply is honoured only in group
    /// conversations; a failed mute is logged and the reply still goes out.
    pub async fn respond(&self, inbound: &InboundMessage) -> Result<Option<OutboundMessage>> {
        let scope = inbound.conversation.scope();
        let span = obs::message_span(&scope);
        self.respond_in(inbound, scope).instrument(span).await
    }

    /// Respond and hand any non-empty reply to `sink`. Returns whether something was sent.
    pub async fn dispatch(&self, inbound: &InboundMessage, sink: &dyn OutboundSink) -> Result<bool> {
        match self.respond(inbound).await? {
            Some(message) if !message.is_empty() => {
                sink.send(&inbound.conversation, message).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn respond_in(
        &self,
        inbound: &InboundMessage,
        scope: Scope,
    ) -> Result<Option<OutboundMessage>> {
        METRICS.inc_messages_handled();
        let text = cq::unescape(&inbound.text);

        let Some(found) = self.store.find(&scope, &text, inbound.to_me, None) else {
            return Ok(None);
        };
        METRICS.inc_messages_matched();

        let Some(raw) = self.choose(&found.replies) else {
            return Ok(None);
        };
        let directive = extract_mute(&raw);
        if let Some(duration) = directive.duration {
            self.mute_sender(inbound, &scope, duration).await;
        }

        let ctx = RenderContext::new(inbound.sender_name.clone(), inbound.sender_id.clone());
        let message = self.renderer.render(&directive.text, &ctx).await?;
        Ok(Some(message))
    }

    fn choose(&self, replies: &[String]) -> Option<String> {
        match self.reply_mode {
            ReplyMode::Random => replies.choose(&mut rand::thread_rng()).cloned(),
            ReplyMode::First => replies.first().cloned(),
        }
    }

    async fn mute_sender(&self, inbound: &InboundMessage, scope: &Scope, duration: Duration) {
        if !inbound.conversation.is_multi_party() {
            debug!("mute directive ignored outside group conversation");
            return;
        }
        let Some(moderation) = &self.moderation else {
            debug!("mute directive ignored, no moderation action configured");
            return;
        };
        if let Err(e) = moderation.mute(scope, &inbound.sender_id, duration).await {
            obs::emit_moderation_failed(scope, &inbound.sender_id, &e);
        }
    }
}
