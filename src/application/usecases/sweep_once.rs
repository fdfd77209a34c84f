use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::{
    LikeClient, LikeEvent, LikeNotifier, LikeOutcome, MutationError, MutationGateway,
};
use crate::domain::{now_epoch, CooldownPolicy, Snapshot};

/// One full scan-and-act pass over all tenants and entries.
///
/// The snapshot is copied out under the gateway lock, the lock is NOT held
/// across remote calls, and updates are merged back in one final locked
/// transaction against whatever the snapshot has become in the meantime.
pub struct SweepOnceUseCase<'a> {
    pub gateway: &'a MutationGateway,
    pub client: &'a dyn LikeClient,
    pub notifier: &'a dyn LikeNotifier,
    pub policy: CooldownPolicy,
    /// Delay between remote calls, for the remote service's own rate limits.
    pub pace: Duration,
    pub cancel: &'a CancellationToken,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub scanned: u32,
    pub liked: u32,
    pub at_limit: u32,
    pub failed: u32,
    pub cancelled: bool,
}

#[derive(Clone, Debug)]
struct SweepUpdate {
    tenant: String,
    region: String,
    uid: String,
    liked_at: i64,
}

impl<'a> SweepOnceUseCase<'a> {
    pub async fn execute(&self) -> Result<SweepSummary, MutationError> {
        let snapshot = self.gateway.read().await?;
        let now = now_epoch();

        let mut summary = SweepSummary::default();
        let mut updates: Vec<SweepUpdate> = Vec::new();

        'sweep: for (tenant, state) in &snapshot.servers {
            for entry in &state.entries {
                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break 'sweep;
                }

                summary.scanned += 1;
                if !self.policy.is_due(entry, now) {
                    continue;
                }

                let liked_at = self.like_one(tenant, state.notify_channel, entry, &mut summary).await;
                if let Some(at) = liked_at {
                    updates.push(SweepUpdate {
                        tenant: tenant.clone(),
                        region: entry.region.clone(),
                        uid: entry.uid.clone(),
                        liked_at: at,
                    });
                }

                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        summary.cancelled = true;
                        break 'sweep;
                    }
                    _ = tokio::time::sleep(self.pace) => {}
                }
            }
        }

        // Merge even a partial (cancelled) pass: confirmed likes must not
        // be re-fired next sweep.
        if !updates.is_empty() {
            self.gateway
                .commit(move |current| {
                    apply_sweep_updates(current, &updates);
                    Ok(())
                })
                .await?;
        }

        Ok(summary)
    }

    /// Probe (when supported) then perform for one due entry. Returns the
    /// confirmed like timestamp, or None when the entry stays untouched.
    async fn like_one(
        &self,
        tenant: &str,
        notify_channel: Option<u64>,
        entry: &crate::domain::LikeEntry,
        summary: &mut SweepSummary,
    ) -> Option<i64> {
        if self.client.supports_probe() {
            match self.client.probe_status(&entry.region, &entry.uid).await {
                Ok(true) => {
                    // Remote already counted a like this window; record it
                    // without spending a perform call.
                    tracing::info!(tenant, uid = %entry.uid, region = %entry.region,
                        "already liked upstream, skipping perform");
                    summary.liked += 1;
                    return Some(now_epoch());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(tenant, uid = %entry.uid, error = %e,
                        "probe failed, performing anyway");
                }
            }
        }

        let outcome = self.client.perform(&entry.region, &entry.uid).await;
        let at_epoch = now_epoch();

        let event = LikeEvent {
            tenant: tenant.to_string(),
            notify_channel,
            uid: entry.uid.clone(),
            region: entry.region.clone(),
            outcome: outcome.clone(),
            at_epoch,
        };
        if let Err(e) = self.notifier.notify(&event).await {
            tracing::warn!(tenant, uid = %entry.uid, error = %e, "notify failed");
        }

        match outcome {
            LikeOutcome::Liked => {
                summary.liked += 1;
                Some(at_epoch)
            }
            LikeOutcome::AlreadyAtLimit => {
                // Not a success: leave last_liked_at alone so the next
                // sweep retries once the remote window rolls over.
                summary.at_limit += 1;
                None
            }
            LikeOutcome::RemoteError(code) => {
                tracing::warn!(tenant, uid = %entry.uid, code, "like call failed");
                summary.failed += 1;
                None
            }
            LikeOutcome::TransportError(cause) => {
                tracing::warn!(tenant, uid = %entry.uid, error = %cause, "like call failed");
                summary.failed += 1;
                None
            }
        }
    }
}

/// Fold sweep results into the current snapshot. Entries removed while the
/// sweep ran stay removed; surviving entries take the larger timestamp so
/// `last_liked_at` never rewinds.
fn apply_sweep_updates(snapshot: &mut Snapshot, updates: &[SweepUpdate]) {
    for update in updates {
        let Some(state) = snapshot.servers.get_mut(&update.tenant) else {
            continue;
        };
        let Some(entry) = state.entry_mut(&update.region, &update.uid) else {
            continue;
        };
        entry.last_liked_at = Some(match entry.last_liked_at {
            Some(prev) => prev.max(update.liked_at),
            None => update.liked_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LikeEntry;

    fn snapshot_with(tenant: &str, entries: Vec<LikeEntry>) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.tenant_mut(tenant).entries = entries;
        snapshot
    }

    fn entry(uid: &str, last: Option<i64>) -> LikeEntry {
        LikeEntry {
            uid: uid.into(),
            region: "ind".into(),
            last_liked_at: last,
            added_by: None,
            added_at: None,
        }
    }

    fn update(tenant: &str, uid: &str, liked_at: i64) -> SweepUpdate {
        SweepUpdate {
            tenant: tenant.into(),
            region: "ind".into(),
            uid: uid.into(),
            liked_at,
        }
    }

    #[test]
    fn merge_sets_timestamp_on_surviving_entry() {
        let mut snapshot = snapshot_with("g1", vec![entry("1234567", None)]);
        apply_sweep_updates(&mut snapshot, &[update("g1", "1234567", 500)]);
        assert_eq!(
            snapshot.tenant("g1").unwrap().entry("ind", "1234567").unwrap().last_liked_at,
            Some(500)
        );
    }

    #[test]
    fn merge_never_resurrects_deleted_entries() {
        // entry was removed by a concurrent command while the sweep ran
        let mut snapshot = snapshot_with("g1", vec![]);
        apply_sweep_updates(&mut snapshot, &[update("g1", "1234567", 500)]);
        assert!(snapshot.tenant("g1").unwrap().entries.is_empty());

        // whole tenant gone is fine too
        let mut snapshot = Snapshot::default();
        apply_sweep_updates(&mut snapshot, &[update("g1", "1234567", 500)]);
        assert!(snapshot.servers.is_empty());
    }

    #[test]
    fn merge_keeps_the_larger_timestamp() {
        let mut snapshot = snapshot_with("g1", vec![entry("1234567", Some(900))]);
        apply_sweep_updates(&mut snapshot, &[update("g1", "1234567", 500)]);
        assert_eq!(
            snapshot.tenant("g1").unwrap().entry("ind", "1234567").unwrap().last_liked_at,
            Some(900)
        );
    }
}
