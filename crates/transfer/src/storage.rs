//! Resource storage under a fixed root directory.
//!
//! Every target is reduced to its final path component before resolution,
//! so a request can only ever name a file directly inside the root.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a target to its location: the root joined with the target's
    /// final path component.
    fn resolve(&self, target: &str) -> PathBuf {
        let name = Path::new(target).file_name().unwrap_or_default();
        self.root.join(name)
    }

    pub async fn exists(&self, target: &str) -> bool {
        fs::try_exists(self.resolve(target)).await.unwrap_or(false)
    }

    pub async fn read_all(&self, target: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(target)).await
    }

    /// Writes the resource bytes verbatim.
    ///
    /// Text mode requires the bytes to be valid UTF-8; binary mode takes
    /// them as they are.
    pub async fn write_all(&self, target: &str, bytes: &[u8], binary: bool) -> io::Result<()> {
        if !binary && std::str::from_utf8(bytes).is_err() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "text resource is not valid utf-8"));
        }

        let path = self.resolve(target);
        debug!(path = %path.display(), bytes = bytes.len(), binary, "writing resource");
        fs::write(path, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage(tag: &str) -> Storage {
        let root = std::env::temp_dir().join(format!("wire-storage-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        Storage::new(root)
    }

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let storage = temp_storage("round-trip");

        storage.write_all("notes.txt", b"hello world", false).await.unwrap();
        assert!(storage.exists("notes.txt").await);
        assert_eq!(storage.read_all("notes.txt").await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn target_reduces_to_final_component() {
        let storage = temp_storage("reduce");

        storage.write_all("/deep/path/name.txt", b"data", false).await.unwrap();
        assert!(storage.exists("name.txt").await);
        assert!(storage.root().join("name.txt").is_file());
    }

    #[tokio::test]
    async fn text_mode_rejects_invalid_utf8() {
        let storage = temp_storage("utf8");

        let result = storage.write_all("broken.txt", &[0xff, 0xfe, 0x00], false).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn binary_mode_takes_bytes_verbatim() {
        let storage = temp_storage("binary");

        let bytes = [0x89u8, 0x50, 0x4e, 0x47, 0x00, 0xff];
        storage.write_all("image.png", &bytes, true).await.unwrap();
        assert_eq!(storage.read_all("image.png").await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn missing_resource() {
        let storage = temp_storage("missing");
        assert!(!storage.exists("nope.txt").await);
        assert!(storage.read_all("nope.txt").await.is_err());
    }
}
