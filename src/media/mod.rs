//! Filesystem-backed media store. Uploaded bytes land under the configured
//! upload root with a unique name and are addressed by a public URL
//! containing the local-storage marker; URLs without the marker belong to
//! external hosts and are never touched.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config;

/// Path segment identifying media owned by this system's storage area.
pub const LOCAL_MARKER: &str = "/uploads/";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("uploaded file exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_upload_bytes,
        }
    }

    pub fn from_config() -> Self {
        let media = &config::config().media;
        Self::new(&media.upload_dir, &media.public_base_url, media.max_upload_bytes)
    }

    /// Upload root, e.g. for serving it as static files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a file stored under the upload root.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}{}{}", self.base_url, LOCAL_MARKER, file_name)
    }

    /// Whether a media URL points into this system's own storage area.
    pub fn is_local(url: &str) -> bool {
        url.contains(LOCAL_MARKER)
    }

    /// Write uploaded bytes under a unique name and return the public URL.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        if bytes.len() > self.max_upload_bytes {
            return Err(MediaError::TooLarge {
                limit: self.max_upload_bytes,
            });
        }

        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), bytes).await?;
        tracing::debug!(file = %file_name, bytes = bytes.len(), "stored upload");

        Ok(self.public_url(&file_name))
    }

    /// Delete the object behind a locally-stored URL. External URLs and
    /// already-missing files are left alone.
    pub async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let Some(marker) = url.find(LOCAL_MARKER) else {
            return Ok(());
        };
        let file_name = &url[marker + LOCAL_MARKER.len()..];
        if file_name.is_empty() || file_name.contains("..") || file_name.contains('/') {
            tracing::warn!(url, "refusing to delete suspicious media path");
            return Ok(());
        }

        match tokio::fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => {
                tracing::debug!(file = %file_name, "deleted stored media");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> MediaStore {
        MediaStore::new(dir, "http://localhost:5000", 1024)
    }

    #[test]
    fn local_marker_detection() {
        assert!(MediaStore::is_local("http://localhost:5000/uploads/a.png"));
        assert!(!MediaStore::is_local("https://cdn.example.com/a.png"));
    }

    #[tokio::test]
    async fn store_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());

        let url = media.store("photo.png", b"fake-png").await.unwrap();
        assert!(url.starts_with("http://localhost:5000/uploads/"));
        assert!(url.ends_with(".png"));

        media.delete(&url).await.unwrap();
        let file_name = url.rsplit('/').next().unwrap();
        assert!(!dir.path().join(file_name).exists());
    }

    #[tokio::test]
    async fn delete_ignores_external_urls() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());
        media
            .delete("https://cdn.example.com/keep-me.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());
        let err = media.store("big.bin", &[0u8; 2048]).await.unwrap_err();
        assert!(matches!(err, MediaError::TooLarge { .. }));
    }
}
