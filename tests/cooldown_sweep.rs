use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use autolike::application::usecases::SweepOnceUseCase;
use autolike::application::{
    AppResult, LikeEvent, LikeNotifier, LikeOutcome, MutationGateway,
};
use autolike::domain::{now_epoch, CooldownPolicy, Region, TenantId, Uid};
use autolike::infrastructure::{fake_client::FakeLikeClient, memory_store::InMemorySnapshotStore};

const DAY: u64 = 24 * 60 * 60;

#[derive(Clone, Default)]
struct RecordingNotifier {
    events: Arc<Mutex<Vec<LikeEvent>>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self::default()
    }

    fn outcomes(&self) -> Vec<LikeOutcome> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.outcome.clone())
            .collect()
    }
}

#[async_trait]
impl LikeNotifier for RecordingNotifier {
    async fn notify(&self, event: &LikeEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct Harness {
    store: InMemorySnapshotStore,
    gateway: Arc<MutationGateway>,
    client: FakeLikeClient,
    notifier: RecordingNotifier,
    cancel: CancellationToken,
}

impl Harness {
    fn new() -> Self {
        let store = InMemorySnapshotStore::new();
        let gateway = Arc::new(MutationGateway::new(Arc::new(store.clone()), false));
        Self {
            store,
            gateway,
            client: FakeLikeClient::new(),
            notifier: RecordingNotifier::new(),
            cancel: CancellationToken::new(),
        }
    }

    async fn sweep(&self) -> autolike::application::usecases::SweepSummary {
        let sweep = SweepOnceUseCase {
            gateway: &self.gateway,
            client: &self.client,
            notifier: &self.notifier,
            policy: CooldownPolicy::new(DAY),
            pace: Duration::ZERO,
            cancel: &self.cancel,
        };
        sweep.execute().await.unwrap()
    }

    async fn last_liked(&self, tenant: &str, region: &str, uid: &str) -> Option<i64> {
        use autolike::application::SnapshotStore;
        let snapshot = self.store.load().await.unwrap();
        snapshot
            .tenant(tenant)
            .and_then(|t| t.entry(region, uid))
            .and_then(|e| e.last_liked_at)
    }
}

fn tenant() -> TenantId {
    TenantId::new("900100200")
}

fn key() -> (Region, Uid) {
    (Region::parse("ind").unwrap(), Uid::parse("1234567").unwrap())
}

#[tokio::test]
async fn first_sweep_likes_new_entry_and_cooldown_holds_until_elapsed() {
    let h = Harness::new();
    let (region, uid) = key();
    h.gateway.add(&tenant(), &region, &uid, Some("tester")).await.unwrap();

    // never-liked entry is due immediately
    let summary = h.sweep().await;
    assert_eq!(summary.liked, 1);
    let first_like = h.last_liked("900100200", "ind", "1234567").await.unwrap();
    assert!(first_like > 0);

    // 6h into the cooldown: scanned but not acted on
    rewind_last_liked(&h, 6 * 60 * 60).await;
    let summary = h.sweep().await;
    assert_eq!(summary.liked, 0);
    assert_eq!(h.client.performed().len(), 1);

    // past the full cooldown: acts again and advances the timestamp
    rewind_last_liked(&h, DAY + 360).await;
    let rewound = h.last_liked("900100200", "ind", "1234567").await.unwrap();
    let summary = h.sweep().await;
    assert_eq!(summary.liked, 1);
    assert_eq!(h.client.performed().len(), 2);
    assert!(h.last_liked("900100200", "ind", "1234567").await.unwrap() > rewound);
}

/// Pretend `seconds` have passed by moving last_liked_at back.
async fn rewind_last_liked(h: &Harness, seconds: u64) {
    use autolike::application::SnapshotStore;
    let mut snapshot = h.store.load().await.unwrap();
    let entry = snapshot
        .tenant_mut("900100200")
        .entry_mut("ind", "1234567")
        .unwrap();
    entry.last_liked_at = Some(now_epoch() - seconds as i64);
    h.store.save(&snapshot).await.unwrap();
}

#[tokio::test]
async fn already_at_limit_leaves_entry_unchanged_and_next_sweep_retries() {
    let h = Harness::new();
    let (region, uid) = key();
    h.gateway.add(&tenant(), &region, &uid, None).await.unwrap();

    h.client.script([LikeOutcome::AlreadyAtLimit]);
    let summary = h.sweep().await;
    assert_eq!(summary.at_limit, 1);
    assert_eq!(summary.liked, 0);
    // nothing recorded, so the entry is still due
    assert_eq!(h.last_liked("900100200", "ind", "1234567").await, None);
    assert_eq!(h.notifier.outcomes(), vec![LikeOutcome::AlreadyAtLimit]);

    // next sweep retries and succeeds
    let summary = h.sweep().await;
    assert_eq!(summary.liked, 1);
    assert_eq!(h.client.performed().len(), 2);
}

#[tokio::test]
async fn one_entity_failing_never_aborts_the_sweep() {
    let h = Harness::new();
    let region = Region::parse("bd").unwrap();
    let first = Uid::parse("1111111").unwrap();
    let second = Uid::parse("2222222").unwrap();
    h.gateway.add(&tenant(), &region, &first, None).await.unwrap();
    h.gateway.add(&tenant(), &region, &second, None).await.unwrap();

    h.client.script([
        LikeOutcome::TransportError("connect timeout".into()),
        LikeOutcome::Liked,
    ]);

    let summary = h.sweep().await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.liked, 1);
    // failed entry untouched, the one after it still processed
    assert_eq!(h.last_liked("900100200", "bd", "1111111").await, None);
    assert!(h.last_liked("900100200", "bd", "2222222").await.is_some());
}

#[tokio::test]
async fn remote_error_is_isolated_too() {
    let h = Harness::new();
    let (region, uid) = key();
    h.gateway.add(&tenant(), &region, &uid, None).await.unwrap();

    h.client.script([LikeOutcome::RemoteError(503)]);
    let summary = h.sweep().await;
    assert_eq!(summary.failed, 1);
    assert_eq!(h.last_liked("900100200", "ind", "1234567").await, None);
}

#[tokio::test]
async fn probe_skips_perform_but_still_records_the_like() {
    let h = Harness::new();
    let (region, uid) = key();
    h.gateway.add(&tenant(), &region, &uid, None).await.unwrap();

    h.client.set_probe(true);
    let summary = h.sweep().await;

    assert_eq!(summary.liked, 1);
    assert_eq!(h.client.probed().len(), 1);
    assert!(h.client.performed().is_empty());
    // externally-confirmed like still puts the entry on cooldown
    assert!(h.last_liked("900100200", "ind", "1234567").await.is_some());
}

#[tokio::test]
async fn probe_false_falls_through_to_perform() {
    let h = Harness::new();
    let (region, uid) = key();
    h.gateway.add(&tenant(), &region, &uid, None).await.unwrap();

    h.client.set_probe(false);
    let summary = h.sweep().await;

    assert_eq!(summary.liked, 1);
    assert_eq!(h.client.probed().len(), 1);
    assert_eq!(h.client.performed().len(), 1);
}

#[tokio::test]
async fn entries_seeded_on_cooldown_wait_a_full_window() {
    let store = InMemorySnapshotStore::new();
    let gateway = Arc::new(MutationGateway::new(Arc::new(store.clone()), true));
    let (region, uid) = key();
    gateway.add(&tenant(), &region, &uid, None).await.unwrap();

    let client = FakeLikeClient::new();
    let notifier = RecordingNotifier::new();
    let cancel = CancellationToken::new();
    let sweep = SweepOnceUseCase {
        gateway: &gateway,
        client: &client,
        notifier: &notifier,
        policy: CooldownPolicy::new(DAY),
        pace: Duration::ZERO,
        cancel: &cancel,
    };

    let summary = sweep.execute().await.unwrap();
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.liked, 0);
    assert!(client.performed().is_empty());
}
