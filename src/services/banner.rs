//! Support banner delivery
//!
//! Loads the image sent with the "support us" menu entry. A missing or
//! unreadable file is never an error: the caller falls back to text.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BannerService {
    path: PathBuf,
}

impl BannerService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the banner bytes, if the file exists and is not empty
    pub async fn load(&self) -> Option<Vec<u8>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => {
                warn!(path = %self.path.display(), "Banner file is empty");
                None
            }
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Banner file not found");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read banner file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_missing_banner_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let banner = BannerService::new(dir.path().join("banner.jpg"));
        assert!(banner.load().await.is_none());
    }

    #[tokio::test]
    async fn test_existing_banner_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xFF\xD8\xFFfake-jpeg").unwrap();

        let banner = BannerService::new(file.path());
        assert_eq!(banner.load().await.as_deref(), Some(&b"\xFF\xD8\xFFfake-jpeg"[..]));
    }

    #[tokio::test]
    async fn test_empty_banner_is_none() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let banner = BannerService::new(file.path());
        assert!(banner.load().await.is_none());
    }
}
