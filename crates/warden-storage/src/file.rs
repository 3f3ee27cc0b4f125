//! File-per-key storage
//!
//! Each key maps to `<root>/<key>`. Writes go to a temp file and are renamed
//! into place so a crash never leaves a half-written value behind.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::store::KeyValueStore;
use crate::Result;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // Keys never start with '.', so the temp name cannot shadow another key
        let tmp_path = self.root.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp_path, value).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::debug!(key = %key, path = %path.display(), "Wrote entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("sessions"));

        assert_eq!(store.read("user_session").await.unwrap(), None);

        store.write("user_session", "value").await.unwrap();
        assert_eq!(
            store.read("user_session").await.unwrap().as_deref(),
            Some("value")
        );
        assert!(!dir.path().join("sessions/.user_session.tmp").exists());

        store.delete("user_session").await.unwrap();
        assert_eq!(store.read("user_session").await.unwrap(), None);
        store.delete("user_session").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = store.write(key, "x").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[tokio::test]
    async fn test_new_instance_sees_existing_value() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::new(dir.path())
            .write("user_session", "kept")
            .await
            .unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(
            reopened.read("user_session").await.unwrap().as_deref(),
            Some("kept")
        );
    }
}
