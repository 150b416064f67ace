//! Reply template rendering.
//!
//! A template is plain text with embedded markers:
//!
//! | marker            | renders as                                   |
//! |-------------------|----------------------------------------------|
//! | `/img <name>`     | image segment with the bytes of `<name>.image` |
//! | `{nickname}`      | sender display name                          |
//! | `{sender_id}`     | sender id                                    |
//! | `{<var>}`         | caller-supplied variable                     |
//! | `{<key>:at}`      | mention of the value of `<key>`              |
//! | `/atme`           | mention of the sender                        |
//! | `/at <digits>`    | mention of that user id                      |
//!
//! Placeholders with an unknown key or format spec stay in the text as written.

pub mod directive;
pub mod message;

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use futures::future::try_join_all;
use regex::Regex;

use crate::media::{media_file_name, MediaResult, MediaStore};

pub use directive::{extract_mute, MuteDirective};
pub use message::{OutboundMessage, Segment};

/// `/img <name>`; the name runs to whitespace or `/`, and a trailing
/// `.image` is absorbed. Group 1 or 2 holds the name.
static MEDIA_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/img (?:([^\s/]+?)\.image|([^\s/]+))").expect("media placeholder pattern is valid")
});

static TEXT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(\w+)(?::(\w+))?\}|/atme\b|/at (\d+)").expect("text placeholder pattern is valid")
});

/// Values available to placeholders while rendering one reply.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub nickname: String,
    pub sender_id: String,
    vars: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new(nickname: impl Into<String>, sender_id: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            sender_id: sender_id.into(),
            vars: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "nickname" => Some(self.nickname.as_str()),
            "sender_id" => Some(self.sender_id.as_str()),
            other => self.vars.get(other).map(String::as_str),
        }
    }
}

/// A template split at its media placeholders.
#[derive(Debug, PartialEq, Eq)]
enum Piece<'t> {
    Text(&'t str),
    Media(&'t str),
}

fn split_media(template: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in MEDIA_PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
            continue;
        };
        pieces.push(Piece::Text(&template[last..whole.start()]));
        pieces.push(Piece::Media(name.as_str()));
        last = whole.end();
    }
    pieces.push(Piece::Text(&template[last..]));
    pieces
}

/// Expand text placeholders in `text` into `out`.
fn expand_text(text: &str, ctx: &RenderContext, out: &mut OutboundMessage) {
    let mut last = 0;
    for caps in TEXT_PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_text(&text[last..whole.start()]);
        last = whole.end();

        let segment = if let Some(key) = caps.get(1) {
            match (ctx.lookup(key.as_str()), caps.get(2).map(|s| s.as_str())) {
                (Some(value), None) => Segment::Text(value.to_string()),
                (Some(value), Some("at")) => Segment::Mention {
                    target: value.to_string(),
                },
                _ => Segment::Text(whole.as_str().to_string()),
            }
        } else if let Some(id) = caps.get(3) {
            Segment::Mention {
                target: id.as_str().to_string(),
            }
        } else {
            Segment::Mention {
                target: ctx.sender_id.clone(),
            }
        };
        out.push(segment);
    }
    out.push_text(&text[last..]);
}

/// Expands reply templates against a media store.
#[derive(Clone)]
pub struct TemplateRenderer {
    media: Arc<dyn MediaStore>,
}

impl TemplateRenderer {
    pub fn new(media: Arc<dyn MediaStore>) -> Self {
        Self { media }
    }

    /// Render `template` into an outbound message.
    ///
    /// Referenced media are loaded concurrently and spliced in order of
    /// occurrence. A missing media file fails the whole render.
    pub async fn render(&self, template: &str, ctx: &RenderContext) -> MediaResult<OutboundMessage> {
        let pieces = split_media(template);

        let files: Vec<String> = pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Media(name) => Some(media_file_name(name)),
                Piece::Text(_) => None,
            })
            .collect();
        let mut loaded = try_join_all(files.iter().map(|f| self.media.load(f)))
            .await?
            .into_iter();

        let mut out = OutboundMessage::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => expand_text(text, ctx, &mut out),
                Piece::Media(name) => {
                    if let Some(data) = loaded.next() {
                        out.push(Segment::Image {
                            name: name.to_string(),
                            data,
                        });
                    }
                }
            }
        }
        Ok(out)
    }
}
