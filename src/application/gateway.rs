use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::{MutationError, SnapshotStore, StoreError};
use crate::domain::{now_epoch, LikeEntry, Region, Snapshot, TenantId, TenantState, Uid};

/// Single serialized entry point for every write transaction against the
/// snapshot. Interactive commands and the sweep's merge-save alike go
/// through the same mutex, so a user command can never race a sweep into a
/// lost update.
pub struct MutationGateway {
    store: Arc<dyn SnapshotStore>,
    lock: Mutex<()>,
    seed_on_cooldown: bool,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn SnapshotStore>, seed_on_cooldown: bool) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            seed_on_cooldown,
        }
    }

    /// Locked read: a consistent copy of the current snapshot.
    pub async fn read(&self) -> Result<Snapshot, MutationError> {
        let _guard = self.lock.lock().await;
        Ok(self.load_or_reset().await?)
    }

    /// Locked read-modify-write. The closure mutates the freshly loaded
    /// snapshot; the result is saved only if it returns Ok. The lock is
    /// held for the whole transaction and for nothing longer.
    pub async fn commit<T, F>(&self, mutate: F) -> Result<T, MutationError>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, MutationError>,
    {
        let _guard = self.lock.lock().await;
        let mut snapshot = self.load_or_reset().await?;
        let out = mutate(&mut snapshot)?;
        self.store
            .save(&snapshot)
            .await
            .map_err(MutationError::from)?;
        Ok(out)
    }

    /// A corrupt snapshot never takes the process down: log, reset to
    /// empty, overwrite the bad file.
    async fn load_or_reset(&self) -> Result<Snapshot, StoreError> {
        match self.store.load().await {
            Ok(snapshot) => Ok(snapshot),
            Err(StoreError::Corrupt(cause)) => {
                tracing::warn!(error = %cause, "snapshot unreadable, resetting to empty");
                let empty = Snapshot::default();
                self.store.save(&empty).await?;
                Ok(empty)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn add(
        &self,
        tenant: &TenantId,
        region: &Region,
        uid: &Uid,
        requester: Option<&str>,
    ) -> Result<(), MutationError> {
        let added_at = now_epoch();
        let last_liked_at = if self.seed_on_cooldown {
            Some(added_at)
        } else {
            None
        };
        let entry = LikeEntry {
            uid: uid.as_str().to_string(),
            region: region.as_str().to_string(),
            last_liked_at,
            added_by: requester.map(str::to_string),
            added_at: Some(added_at),
        };

        let tenant_key = tenant.as_str().to_string();
        self.commit(move |snapshot| {
            let state = snapshot.tenant_mut(&tenant_key);
            if state.contains(&entry.region, &entry.uid) {
                return Err(MutationError::AlreadyExists {
                    uid: entry.uid,
                    region: entry.region,
                });
            }
            state.entries.push(entry);
            Ok(())
        })
        .await
    }

    pub async fn remove(
        &self,
        tenant: &TenantId,
        region: &Region,
        uid: &Uid,
    ) -> Result<(), MutationError> {
        let tenant_key = tenant.as_str().to_string();
        let region = region.as_str().to_string();
        let uid = uid.as_str().to_string();
        self.commit(move |snapshot| {
            let removed = snapshot
                .servers
                .get_mut(&tenant_key)
                .map(|state| state.remove_entry(&region, &uid))
                .unwrap_or(false);
            if removed {
                Ok(())
            } else {
                Err(MutationError::NotFound { uid, region })
            }
        })
        .await
    }

    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<LikeEntry>, MutationError> {
        let snapshot = self.read().await?;
        Ok(snapshot
            .tenant(tenant.as_str())
            .map(|state| state.entries.clone())
            .unwrap_or_default())
    }

    /// Drop every entry for the tenant; channel configuration stays.
    pub async fn clear(&self, tenant: &TenantId) -> Result<(), MutationError> {
        let tenant_key = tenant.as_str().to_string();
        self.commit(move |snapshot| {
            if let Some(state) = snapshot.servers.get_mut(&tenant_key) {
                state.entries.clear();
            }
            Ok(())
        })
        .await
    }

    pub async fn set_notify_channel(
        &self,
        tenant: &TenantId,
        channel: u64,
    ) -> Result<(), MutationError> {
        let tenant_key = tenant.as_str().to_string();
        self.commit(move |snapshot| {
            snapshot.tenant_mut(&tenant_key).notify_channel = Some(channel);
            Ok(())
        })
        .await
    }

    pub async fn set_allowed_channels(
        &self,
        tenant: &TenantId,
        channels: Vec<u64>,
    ) -> Result<(), MutationError> {
        let tenant_key = tenant.as_str().to_string();
        self.commit(move |snapshot| {
            snapshot.tenant_mut(&tenant_key).allowed_channels = channels;
            Ok(())
        })
        .await
    }

    /// Full per-tenant state, for the presentation layer (channel config,
    /// allow-list checks, listings with time-remaining).
    pub async fn tenant_state(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<TenantState>, MutationError> {
        let snapshot = self.read().await?;
        Ok(snapshot.tenant(tenant.as_str()).cloned())
    }
}
