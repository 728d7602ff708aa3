// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout of generated artifacts.
//!
//! ```text
//! <root>/images/<id>.png
//! <root>/audio/<id>_single.mp3
//! <root>/audio/<id>.mp3
//! <root>/chunks/<id>/playlist.m3u8   (+ index.m3u8, 0.ts, 1.ts, ...)
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use beacon_core::MANIFEST_NAME;
use beacon_core::{BeaconError, NotificationId};
use tracing::debug;

/// Filesystem store for per-notification artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_path(&self, id: &NotificationId) -> PathBuf {
        self.root.join("images").join(format!("{id}.png"))
    }

    pub fn single_audio_path(&self, id: &NotificationId) -> PathBuf {
        self.root.join("audio").join(format!("{id}_single.mp3"))
    }

    pub fn audio_path(&self, id: &NotificationId) -> PathBuf {
        self.root.join("audio").join(format!("{id}.mp3"))
    }

    pub fn chunk_dir(&self, id: &NotificationId) -> PathBuf {
        self.root.join("chunks").join(id.as_str())
    }

    pub fn manifest_path(&self, id: &NotificationId) -> PathBuf {
        self.chunk_dir(id).join(MANIFEST_NAME)
    }

    /// Creates the directories a generation run writes into.
    pub async fn prepare(&self, id: &NotificationId) -> Result<(), BeaconError> {
        for dir in [
            self.root.join("images"),
            self.root.join("audio"),
            self.chunk_dir(id),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| BeaconError::Media {
                    message: format!("cannot create {}", dir.display()),
                    source: Some(Box::new(e)),
                })?;
        }
        Ok(())
    }

    /// Whether the stream manifest exists and is non-empty.
    ///
    /// Any I/O error (including a file vanishing mid-check) reads as "not ready".
    pub async fn is_ready(&self, id: &NotificationId) -> bool {
        match tokio::fs::metadata(self.manifest_path(id)).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// Resolves a file inside a notification's chunk directory for serving.
    ///
    /// Returns `None` for anything that is not a plain file name, so requests
    /// cannot escape the chunk directory.
    pub fn chunk_file(&self, id: &str, file: &str) -> Option<PathBuf> {
        if !is_plain_name(id) || !is_plain_name(file) {
            return None;
        }
        Some(self.root.join("chunks").join(id).join(file))
    }

    /// Removes every artifact of a notification. Missing files are ignored.
    pub async fn purge(&self, id: &NotificationId) -> Result<(), BeaconError> {
        for file in [
            self.image_path(id),
            self.single_audio_path(id),
            self.audio_path(id),
        ] {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(BeaconError::media(format!("cannot remove {}: {e}", file.display()))),
            }
        }
        match tokio::fs::remove_dir_all(self.chunk_dir(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BeaconError::media(format!("cannot remove chunks for {id}: {e}"))),
        }
        debug!(notification_id = %id, "artifacts purged");
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_keyed_by_id() {
        let store = ArtifactStore::new("/data");
        let id = NotificationId::from("abc");
        assert_eq!(store.image_path(&id), Path::new("/data/images/abc.png"));
        assert_eq!(store.single_audio_path(&id), Path::new("/data/audio/abc_single.mp3"));
        assert_eq!(store.audio_path(&id), Path::new("/data/audio/abc.mp3"));
        assert_eq!(
            store.manifest_path(&id),
            Path::new("/data/chunks/abc/playlist.m3u8")
        );
    }

    #[test]
    fn chunk_file_rejects_traversal() {
        let store = ArtifactStore::new("/data");
        assert!(store.chunk_file("abc", "0.ts").is_some());
        assert!(store.chunk_file("abc", "../../etc/passwd").is_none());
        assert!(store.chunk_file("..", "playlist.m3u8").is_none());
        assert!(store.chunk_file("abc", "").is_none());
        assert!(store.chunk_file("abc", "a\\b").is_none());
    }

    #[tokio::test]
    async fn readiness_requires_non_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let id = NotificationId::from("n1");

        assert!(!store.is_ready(&id).await);
        store.prepare(&id).await.unwrap();
        tokio::fs::write(store.manifest_path(&id), b"").await.unwrap();
        assert!(!store.is_ready(&id).await, "empty manifest is not ready");
        tokio::fs::write(store.manifest_path(&id), b"#EXTM3U\n").await.unwrap();
        assert!(store.is_ready(&id).await);
    }

    #[tokio::test]
    async fn purge_removes_everything_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let id = NotificationId::from("n2");

        store.purge(&id).await.unwrap();
        store.prepare(&id).await.unwrap();
        tokio::fs::write(store.image_path(&id), b"png").await.unwrap();
        tokio::fs::write(store.manifest_path(&id), b"#EXTM3U\n").await.unwrap();
        store.purge(&id).await.unwrap();
        assert!(!store.image_path(&id).exists());
        assert!(!store.chunk_dir(&id).exists());
    }
}
