use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WordBankError;

/// How a trigger is compared against an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Trigger equals the message.
    Exact,
    /// Trigger occurs within the message.
    Substring,
    /// Trigger is a pattern searched against the message.
    Regex,
}

impl Strategy {
    /// Evaluation order when no strategy is requested. First non-empty result wins.
    pub const ALL: [Strategy; 3] = [Strategy::Exact, Strategy::Substring, Strategy::Regex];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Regex => "regex",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = WordBankError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "congruence" => Ok(Self::Exact),
            "substring" | "include" => Ok(Self::Substring),
            "regex" => Ok(Self::Regex),
            other => Err(WordBankError::InvalidStrategy(other.to_string())),
        }
    }
}
