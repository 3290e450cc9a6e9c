// video_store.rs

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::global_variables::ALLOWED_VIDEO_EXTENSIONS;

/// Durable destination for uploaded junction videos.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Stores `bytes` under `file_name` and returns where they ended up.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PersistenceError>;
}

/// Stores videos as files in a single directory watched by the analyzer.
#[derive(Debug, Clone)]
pub struct DirectoryVideoStore {
    dir: PathBuf,
}

impl DirectoryVideoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Only plain names with an mp4, avi or mov extension are accepted.
pub fn validate_video_name(file_name: &str) -> Result<(), PersistenceError> {
    let is_plain = !file_name.is_empty()
        && !file_name.contains(['/', '\\'])
        && file_name != "."
        && file_name != "..";
    if !is_plain {
        return Err(PersistenceError::InvalidFileName(file_name.to_string()));
    }

    let extension = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return Err(PersistenceError::UnsupportedExtension(String::new())),
    };
    if !ALLOWED_VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        return Err(PersistenceError::UnsupportedExtension(extension));
    }
    Ok(())
}

#[async_trait]
impl VideoStore for DirectoryVideoStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PersistenceError> {
        validate_video_name(file_name)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PersistenceError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;

        log::info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_video_names() {
        assert!(validate_video_name("junction1.mp4").is_ok());
        assert!(validate_video_name("clip.MOV").is_ok());
        assert!(validate_video_name("night.avi").is_ok());
    }

    #[test]
    fn rejects_unsupported_or_unsafe_names() {
        assert!(matches!(
            validate_video_name("notes.txt"),
            Err(PersistenceError::UnsupportedExtension(ext)) if ext == "txt"
        ));
        assert!(matches!(
            validate_video_name("mp4"),
            Err(PersistenceError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            validate_video_name("../junction1.mp4"),
            Err(PersistenceError::InvalidFileName(_))
        ));
        assert!(matches!(
            validate_video_name(""),
            Err(PersistenceError::InvalidFileName(_))
        ));
    }

    #[tokio::test]
    async fn stores_bytes_in_created_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryVideoStore::new(dir.path().join("Videos"));

        let path = store.store("junction2.mp4", b"frames").await.unwrap();

        assert_eq!(path, dir.path().join("Videos").join("junction2.mp4"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"frames".to_vec());
    }

    #[tokio::test]
    async fn write_failure_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the directory should be.
        let blocker = dir.path().join("Videos");
        tokio::fs::write(&blocker, b"").await.unwrap();
        let store = DirectoryVideoStore::new(&blocker);

        let err = store.store("junction1.mp4", b"frames").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));
    }
}
