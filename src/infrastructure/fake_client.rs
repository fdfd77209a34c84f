use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::{AppError, AppResult, LikeClient, LikeOutcome};

/// In-memory like client for tests and `--dry-run`. Outcomes are served
/// from a script queue, falling back to `Liked`; every call is recorded.
#[derive(Clone, Default)]
pub struct FakeLikeClient {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    script: VecDeque<LikeOutcome>,
    probe: Option<bool>,
    performed: Vec<(String, String)>, // (region, uid)
    probed: Vec<(String, String)>,
}

impl FakeLikeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the next `perform` calls, in order.
    pub fn script(&self, outcomes: impl IntoIterator<Item = LikeOutcome>) {
        self.inner.lock().unwrap().script.extend(outcomes);
    }

    /// Make `supports_probe` true and answer every probe with `answer`.
    pub fn set_probe(&self, answer: bool) {
        self.inner.lock().unwrap().probe = Some(answer);
    }

    pub fn performed(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().performed.clone()
    }

    pub fn probed(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().probed.clone()
    }
}

#[async_trait]
impl LikeClient for FakeLikeClient {
    async fn perform(&self, region: &str, uid: &str) -> LikeOutcome {
        let mut inner = self.inner.lock().unwrap();
        inner.performed.push((region.to_string(), uid.to_string()));
        inner.script.pop_front().unwrap_or(LikeOutcome::Liked)
    }

    fn supports_probe(&self) -> bool {
        self.inner.lock().unwrap().probe.is_some()
    }

    async fn probe_status(&self, region: &str, uid: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.probed.push((region.to_string(), uid.to_string()));
        inner
            .probe
            .ok_or_else(|| AppError::Client("probe not supported".into()))
    }
}
