use std::fmt;

use async_trait::async_trait;

use crate::domain::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("client error: {0}")]
    Client(String),
    #[error("notifier error: {0}")]
    Notifier(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing data exists but cannot be parsed. Recoverable: the gateway
    /// resets to an empty snapshot and overwrites.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
    #[error("io error: {0}")]
    Io(String),
}

/// User-facing mutation failures, rendered by the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("uid {uid} ({region}) is already in the auto-like list")]
    AlreadyExists { uid: String, region: String },
    #[error("uid {uid} ({region}) is not in the auto-like list")]
    NotFound { uid: String, region: String },
    #[error("storage error: {0}")]
    Store(String),
}

impl From<StoreError> for MutationError {
    fn from(e: StoreError) -> Self {
        MutationError::Store(e.to_string())
    }
}

/// Result of one remote like call. Failure modes are data, not errors;
/// the sweep logs them and moves on to the next entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    AlreadyAtLimit,
    RemoteError(u16),
    TransportError(String),
}

impl fmt::Display for LikeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeOutcome::Liked => write!(f, "liked"),
            LikeOutcome::AlreadyAtLimit => write!(f, "already at daily limit"),
            LikeOutcome::RemoteError(code) => write!(f, "remote error (http {code})"),
            LikeOutcome::TransportError(cause) => write!(f, "transport error: {cause}"),
        }
    }
}

/// Atomic load/save of the whole snapshot. A missing backing file is the
/// empty snapshot, not an error.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> Result<Snapshot, StoreError>;
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// The remote like API for one uid on one region.
#[async_trait]
pub trait LikeClient: Send + Sync {
    /// Exactly one network call; never fails, every failure mode is an
    /// outcome variant.
    async fn perform(&self, region: &str, uid: &str) -> LikeOutcome;

    /// Whether `probe_status` is worth calling before `perform`.
    fn supports_probe(&self) -> bool {
        false
    }

    /// Has this uid already been liked inside the current window, according
    /// to the remote service itself.
    async fn probe_status(&self, region: &str, uid: &str) -> AppResult<bool> {
        let _ = (region, uid);
        Err(AppError::Client("probe not supported".into()))
    }
}

/// One per-entry outcome produced during a sweep, addressed to the tenant's
/// configured log channel (if any).
#[derive(Clone, Debug)]
pub struct LikeEvent {
    pub tenant: String,
    pub notify_channel: Option<u64>,
    pub uid: String,
    pub region: String,
    pub outcome: LikeOutcome,
    pub at_epoch: i64,
}

/// Deliver sweep outcomes. Failures are logged by the caller, never fatal.
#[async_trait]
pub trait LikeNotifier: Send + Sync {
    async fn notify(&self, event: &LikeEvent) -> AppResult<()>;
}
