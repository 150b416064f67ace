//! Administrative directives embedded in reply templates.
//!
//! A reply containing `/ban <seconds>` asks the responder to mute the sender
//! for that long. The directive is removed before the reply is rendered.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static MUTE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/ban\s*(\d+)").expect("mute directive pattern is valid"));

/// Reply text with any mute directive stripped, plus the requested duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteDirective {
    pub text: String,
    /// `None` when absent, zero, or too large to represent
    pub duration: Option<Duration>,
}

/// Split a raw reply into its text and mute request.
///
/// Only the first directive's duration is used; every directive is stripped.
pub fn extract_mute(template: &str) -> MuteDirective {
    let Some(caps) = MUTE_DIRECTIVE.captures(template) else {
        return MuteDirective {
            text: template.to_string(),
            duration: None,
        };
    };

    let duration = caps[1]
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let text = MUTE_DIRECTIVE.replace_all(template, "").trim().to_string();

    MuteDirective { text, duration }
}
