//! Word bank configuration.
//!
//! Defaults are read from the environment:
//!
//! - `WORDBANK_DATA_DIR`: root directory (default `data/word_bank`)
//! - `WORDBANK_REPLY_MODE`: `random` (default) or `first`
//! - `WORDBANK_NICKNAMES`: comma-separated bot nicknames

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::WordBankError;

/// File name of the persisted bank inside the data directory.
pub const BANK_FILE_NAME: &str = "bank.json";

/// Media directory inside the data directory.
pub const MEDIA_DIR_NAME: &str = "img";

/// How one reply is picked when a trigger has several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    #[default]
    Random,
    First,
}

impl FromStr for ReplyMode {
    type Err = WordBankError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "first" => Ok(Self::First),
            other => Err(WordBankError::InvalidCommand(format!(
                "unknown reply mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordBankConfig {
    /// Root directory holding the bank file and media directory
    pub data_dir: PathBuf,
    /// Reply selection when a trigger carries several replies
    pub reply_mode: ReplyMode,
    /// Names the bot answers to; a trigger starting with one is mention-only
    pub nicknames: Vec<String>,
}

impl Default for WordBankConfig {
    fn default() -> Self {
        WordBankConfig {
            data_dir: std::env::var("WORDBANK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/word_bank")),
            reply_mode: std::env::var("WORDBANK_REPLY_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            nicknames: std::env::var("WORDBANK_NICKNAMES")
                .map(|v| parse_nicknames(&v))
                .unwrap_or_default(),
        }
    }
}

impl WordBankConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_reply_mode(mut self, mode: ReplyMode) -> Self {
        self.reply_mode = mode;
        self
    }

    pub fn with_nicknames<I, S>(mut self, nicknames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nicknames = nicknames.into_iter().map(Into::into).collect();
        self
    }

    pub fn bank_path(&self) -> PathBuf {
        self.data_dir.join(BANK_FILE_NAME)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join(MEDIA_DIR_NAME)
    }
}

fn parse_nicknames(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
