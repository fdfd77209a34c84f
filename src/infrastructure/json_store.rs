use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::{SnapshotStore, StoreError};
use crate::domain::Snapshot;

/// Snapshot persisted as one JSON document. Saves go to `<path>.tmp` first
/// and are renamed over the canonical file, so readers never see a partial
/// write and a crash mid-save leaves the previous snapshot intact.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_owned();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let payload =
            serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Io(e.to_string()))?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &payload)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LikeEntry;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        let tenant = snapshot.tenant_mut("123456789");
        tenant.notify_channel = Some(42);
        tenant.entries.push(LikeEntry {
            uid: "1234567".into(),
            region: "ind".into(),
            last_liked_at: Some(1_700_000_000),
            added_by: Some("someone".into()),
            added_at: Some(1_699_999_000),
        });
        snapshot
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().await.unwrap(), Snapshot::default());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("state.json"));

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await.unwrap(), snapshot);

        // no tmp file left behind
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_corrupt_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonSnapshotStore::new(&path);
        match store.load().await {
            Err(StoreError::Corrupt(_)) => {}
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_tmp_file_never_shadows_the_snapshot() {
        // a crash between tmp-write and rename leaves garbage in .tmp; the
        // canonical file must still load untouched
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonSnapshotStore::new(&path);

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();
        std::fs::write(dir.path().join("state.json.tmp"), b"garbage{{{").unwrap();

        assert_eq!(store.load().await.unwrap(), snapshot);

        // next save replaces the stale tmp and the canonical file
        store.save(&Snapshot::default()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Snapshot::default());
    }
}
