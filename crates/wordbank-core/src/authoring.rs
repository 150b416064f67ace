//! Rule authoring: command parsing, trigger normalisation and media ingest.
//!
//! Permission checks and delete/clear confirmation belong to the chat
//! adapter; everything here assumes the caller is already authorised.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::cq;
use crate::domain::{Scope, Strategy};
use crate::error::{Result, WordBankError};
use crate::matcher::MENTION_PREFIX;
use crate::media::{ingest_inline_media, InlineMedia, MediaStore, RemoteFetch};
use crate::store::RuleStore;

/// `[flags]问<trigger>答<reply>`; flags are any of 全局 模糊 正则 @.
static SET_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^((?:全局|模糊|正则|@)*)\s*问\s?(.+?)\s?答\s?(.+)")
        .expect("set command pattern is valid")
});

/// A parsed authoring command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCommand {
    pub global: bool,
    pub mention_only: bool,
    pub strategy: Strategy,
    pub trigger: String,
    pub reply: String,
}

impl SetCommand {
    pub fn parse(text: &str) -> Result<Self> {
        let caps = SET_COMMAND
            .captures(text)
            .ok_or_else(|| WordBankError::InvalidCommand(text.to_string()))?;
        let flags = &caps[1];

        let strategy = if flags.contains("正则") {
            Strategy::Regex
        } else if flags.contains("模糊") {
            Strategy::Substring
        } else {
            Strategy::Exact
        };

        Ok(SetCommand {
            global: flags.contains("全局"),
            mention_only: flags.contains('@'),
            strategy,
            trigger: caps[2].to_string(),
            reply: caps[3].to_string(),
        })
    }

    /// Resolve scope and trigger for a command issued in `conversation`.
    pub fn into_draft(self, conversation: Scope, nicknames: &[String]) -> RuleDraft {
        RuleDraft {
            scope: if self.global { Scope::global() } else { conversation },
            trigger: normalize_trigger(&self.trigger, self.mention_only, nicknames),
            reply: self.reply,
            strategy: self.strategy,
        }
    }
}

/// A rule ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub scope: Scope,
    pub trigger: String,
    pub reply: String,
    pub strategy: Strategy,
}

/// Mention-only triggers get the mention prefix; so does a trigger that starts
/// with one of the bot's nicknames, which is replaced by the prefix.
pub fn normalize_trigger(trigger: &str, mention_only: bool, nicknames: &[String]) -> String {
    let trigger = cq::unescape(trigger);
    if mention_only {
        return format!("{MENTION_PREFIX}{trigger}");
    }
    nicknames
        .iter()
        .filter(|name| !name.is_empty())
        .find_map(|name| trigger.strip_prefix(name.as_str()))
        .map(|rest| format!("{MENTION_PREFIX}{}", rest.trim_start()))
        .unwrap_or(trigger)
}

/// Writes drafts into the rule store, ingesting attached images first.
pub struct Authoring {
    store: Arc<RuleStore>,
    media: Arc<dyn MediaStore>,
    fetcher: Arc<dyn RemoteFetch>,
}

impl Authoring {
    pub fn new(
        store: Arc<RuleStore>,
        media: Arc<dyn MediaStore>,
        fetcher: Arc<dyn RemoteFetch>,
    ) -> Self {
        Self {
            store,
            media,
            fetcher,
        }
    }

    /// Store `draft`, returning the number of replies now under its trigger.
    ///
    /// Attached images are fetched and saved before the rule store is touched.
    /// When the trigger itself carries an image the reply is stored verbatim.
    pub async fn author(&self, draft: RuleDraft, inline_media: &[InlineMedia]) -> Result<usize> {
        let reply = if !inline_media.is_empty() && !cq::has_inline_image(&draft.trigger) {
            ingest_inline_media(
                self.media.as_ref(),
                self.fetcher.as_ref(),
                inline_media,
                &draft.reply,
            )
            .await?
        } else {
            draft.reply
        };
        self.store
            .set(&draft.scope, &draft.trigger, &reply, draft.strategy)
    }
}
