//! Attachment blob storage
//!
//! The engine records attachment metadata in the content document; the bytes
//! themselves go through this store. The default implementation writes to a
//! local uploads directory and returns a URL path served by the HTTP layer's
//! reverse proxy or a CDN in front of it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::types::{LaurelError, Result};

/// Store contract for attachment bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist the bytes and return the public URL for the stored file
    async fn store(&self, bytes: &[u8], file_name: &str, content_type: &str) -> Result<String>;
}

/// Filesystem-backed blob store
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    /// Strip path separators and anything else that could escape the
    /// uploads directory.
    fn sanitize(file_name: &str) -> String {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        name.chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: &[u8], file_name: &str, _content_type: &str) -> Result<String> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| LaurelError::Internal(format!("cannot create uploads dir: {}", e)))?;

        // Prefix with a fresh id so concurrent uploads of the same name
        // never collide.
        let stored_name = format!("{}-{}", Uuid::new_v4(), Self::sanitize(file_name));
        let path = self.root.join(&stored_name);

        fs::write(&path, bytes)
            .await
            .map_err(|e| LaurelError::Internal(format!("failed to write upload: {}", e)))?;

        Ok(format!(
            "{}/{}",
            self.public_prefix.trim_end_matches('/'),
            stored_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(LocalBlobStore::sanitize("../../etc/passwd"), "passwd");
        assert_eq!(LocalBlobStore::sanitize("certificate.pdf"), "certificate.pdf");
        assert_eq!(LocalBlobStore::sanitize("weird name!.png"), "weird_name_.png");
        assert_eq!(LocalBlobStore::sanitize(""), "upload");
    }

    #[tokio::test]
    async fn test_store_and_url_shape() {
        let dir = std::env::temp_dir().join(format!("laurel-blob-test-{}", Uuid::new_v4()));
        let store = LocalBlobStore::new(&dir, "/uploads");

        let url = store
            .store(b"hello", "proof.pdf", "application/pdf")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("-proof.pdf"));

        let stored = dir.join(url.strip_prefix("/uploads/").unwrap());
        assert_eq!(fs::read(stored).await.unwrap(), b"hello");

        let _ = fs::remove_dir_all(dir).await;
    }
}
