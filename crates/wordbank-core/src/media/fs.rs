use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{validate_name, MediaError, MediaResult, MediaStore};

/// Filesystem-backed media store.
///
/// Layout: `<root>/<name>`, one file per stored name.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> MediaResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> MediaResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        let path = self.file_path(name)?;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load(&self, name: &str) -> MediaResult<Vec<u8>> {
        let path = self.file_path(name)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::NotFound {
                    name: name.to_string(),
                }
            } else {
                MediaError::Io(e)
            }
        })
    }

    async fn contains(&self, name: &str) -> MediaResult<bool> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, FsMediaStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path().join("img")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let (_dir, store) = make_store();
        store.save("pic.image", b"\x89PNG").await.unwrap();
        assert_eq!(store.load("pic.image").await.unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (_dir, store) = make_store();
        store.save("a.image", b"one").await.unwrap();
        store.save("a.image", b"two").await.unwrap();
        assert_eq!(store.load("a.image").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_load_missing_returns_not_found() {
        let (_dir, store) = make_store();
        match store.load("nope.image").await {
            Err(MediaError::NotFound { name }) => assert_eq!(name, "nope.image"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_contains() {
        let (_dir, store) = make_store();
        assert!(!store.contains("x.image").await.unwrap());
        store.save("x.image", b"").await.unwrap();
        assert!(store.contains("x.image").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, store) = make_store();
        let err = store.save("../escape.image", b"x").await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidName { .. }));
    }
}
