//! Outbound message representation.

use std::fmt;

/// One piece of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Image { name: String, data: Vec<u8> },
    Mention { target: String },
}

/// Ordered segments ready for the platform adapter.
///
/// Adjacent text is coalesced and empty text is dropped on push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    segments: Vec<Segment>,
}

impl OutboundMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Text(text) => self.push_text(&text),
            other => self.segments.push(other),
        }
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenated text segments, ignoring images and mentions.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => f.write_str(t)?,
                Segment::Image { name, data } => write!(f, "[image:{} ({} bytes)]", name, data.len())?,
                Segment::Mention { target } => write!(f, "[@{}]", target)?,
            }
        }
        Ok(())
    }
}
