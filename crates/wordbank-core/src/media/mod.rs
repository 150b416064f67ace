//! Media store: attachment bytes saved and loaded by file name.
//!
//! Reply templates never embed bytes. They reference a stored file with an
//! `/img <name>` placeholder, where `<name>` omits the [`IMAGE_EXTENSION`]
//! that the stored file carries.

pub mod fs;
pub mod http;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::METRICS;
use crate::obs;

/// Extension appended to every stored media file.
pub const IMAGE_EXTENSION: &str = "image";

/// Inline image codes as they arrive in raw chat text, e.g.
/// `[CQ:image,file=3f2a.image,url=https://...]`. Group 1 is the file stem.
static INLINE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[CQ:image,[^\]]*?file=([^,\]]+?)(?:\.[A-Za-z0-9]+)?(?:,[^\]]*)?\]")
        .expect("inline image pattern is valid")
});

/// Errors from media operations.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media not found: {name}")]
    NotFound { name: String },

    #[error("invalid media name: {name:?}")]
    InvalidName { name: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::Fetch(err.to_string())
    }
}

pub type MediaResult<T> = std::result::Result<T, MediaError>;

/// Byte storage keyed by file name.
///
/// No deduplication and no format validation. Saving an existing name
/// overwrites it.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, name: &str, data: &[u8]) -> MediaResult<()>;

    /// Returns `MediaError::NotFound` if nothing is stored under `name`.
    async fn load(&self, name: &str) -> MediaResult<Vec<u8>>;

    async fn contains(&self, name: &str) -> MediaResult<bool>;
}

/// Fetches remote bytes while authoring image replies.
#[async_trait]
pub trait RemoteFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> MediaResult<Vec<u8>>;
}

/// An image attached to an authoring message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMedia {
    pub url: String,
    /// File name as it appears in the inline code, extension included
    pub file: String,
}

/// Reject names that could escape the media directory.
pub fn validate_name(name: &str) -> MediaResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(MediaError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Stored file name for a placeholder name: `pic` becomes `pic.image`.
/// A name that already ends in the extension is left alone.
pub fn media_file_name(name: &str) -> String {
    let suffix = format!(".{IMAGE_EXTENSION}");
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// `3f2a.jpg` becomes `3f2a`; a name without an extension is unchanged.
fn file_stem(file: &str) -> &str {
    match file.rfind('.') {
        Some(idx) if idx > 0 => &file[..idx],
        _ => file,
    }
}

/// Fetch and store every inline image, then rewrite each inline image code in
/// `template` to the `/img <stem>` placeholder.
///
/// Bytes are saved under `<stem>.image` so the renderer can find them again.
/// Nothing is rewritten if any fetch or save fails.
pub async fn ingest_inline_media(
    store: &dyn MediaStore,
    fetcher: &dyn RemoteFetch,
    media: &[InlineMedia],
    template: &str,
) -> MediaResult<String> {
    for item in media {
        let stored = media_file_name(file_stem(&item.file));
        validate_name(&stored)?;
        let data = fetcher.fetch(&item.url).await?;
        store.save(&stored, &data).await?;
        METRICS.inc_media_saved();
        obs::emit_media_saved(&stored, data.len());
    }
    Ok(INLINE_IMAGE.replace_all(template, "/img $1").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{MemoryMediaStore, StaticFetcher};

    #[test]
    fn test_validate_name() {
        assert!(validate_name("pic.image").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("a\\b").is_err());
    }

    #[test]
    fn test_media_file_name() {
        assert_eq!(media_file_name("pic"), "pic.image");
        assert_eq!(media_file_name("pic.image"), "pic.image");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("3f2a.image"), "3f2a");
        assert_eq!(file_stem("a.b.jpg"), "a.b");
        assert_eq!(file_stem("plain"), "plain");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_inline_image_pattern_rewrites() {
        let raw = "look [CQ:image,file=abc123.image,url=https://x/y] and [CQ:image,file=def.jpg]";
        let out = INLINE_IMAGE.replace_all(raw, "/img $1");
        assert_eq!(out, "look /img abc123 and /img def");
    }

    #[tokio::test]
    async fn test_ingest_saves_and_rewrites() {
        let store = MemoryMediaStore::new();
        let fetcher = StaticFetcher::new().with("https://cdn/a", b"PNGDATA".to_vec());
        let media = vec![InlineMedia {
            url: "https://cdn/a".to_string(),
            file: "abc.image".to_string(),
        }];

        let out = ingest_inline_media(
            &store,
            &fetcher,
            &media,
            "see [CQ:image,file=abc.image,url=https://cdn/a]",
        )
        .await
        .unwrap();

        assert_eq!(out, "see /img abc");
        assert_eq!(store.load("abc.image").await.unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_ingest_fetch_failure_propagates() {
        let store = MemoryMediaStore::new();
        let fetcher = StaticFetcher::new();
        let media = vec![InlineMedia {
            url: "https://cdn/missing".to_string(),
            file: "x.image".to_string(),
        }];
        let err = ingest_inline_media(&store, &fetcher, &media, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Fetch(_)));
        assert!(!store.contains("x.image").await.unwrap());
    }
}
