use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::{SnapshotStore, StoreError};
use crate::domain::Snapshot;

/// Snapshot store backed by process memory. Tests only.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    inner: Arc<Mutex<Snapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(snapshot)),
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".into()))?;
        Ok(inner.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".into()))?;
        *inner = snapshot.clone();
        Ok(())
    }
}
