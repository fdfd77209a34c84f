use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::usecases::SweepOnceUseCase;
use crate::application::{LikeClient, LikeNotifier, MutationGateway};
use crate::domain::CooldownPolicy;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub sweep_interval: Duration,
    pub cooldown_seconds: u64,
    /// Delay between remote calls inside one sweep.
    pub pace: Duration,
}

/// Owns the periodic sweep. `start` hands back an explicit handle; the loop
/// is a cancellable unit of work owned by the process supervisor, not a
/// side effect of some object's lifecycle.
pub struct Scheduler {
    gateway: Arc<MutationGateway>,
    client: Arc<dyn LikeClient>,
    notifier: Arc<dyn LikeNotifier>,
    config: SchedulerConfig,
}

pub struct SchedulerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Request shutdown without waiting.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the loop to persist partial progress and exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "scheduler task panicked");
        }
    }
}

impl Scheduler {
    pub fn new(
        gateway: Arc<MutationGateway>,
        client: Arc<dyn LikeClient>,
        notifier: Arc<dyn LikeNotifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            gateway,
            client,
            notifier,
            config,
        }
    }

    pub fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let join = tokio::spawn(async move { self.run(child).await });
        SchedulerHandle { cancel, join }
    }

    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_seconds = self.config.sweep_interval.as_secs(),
            cooldown_seconds = self.config.cooldown_seconds,
            "auto-like scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let sweep = SweepOnceUseCase {
                gateway: &self.gateway,
                client: self.client.as_ref(),
                notifier: self.notifier.as_ref(),
                policy: CooldownPolicy::new(self.config.cooldown_seconds),
                pace: self.config.pace,
                cancel: &cancel,
            };

            // Per-entry failures are folded into the summary; an error here
            // is a storage problem, logged and retried next tick.
            match sweep.execute().await {
                Ok(summary) => {
                    tracing::info!(
                        scanned = summary.scanned,
                        liked = summary.liked,
                        at_limit = summary.at_limit,
                        failed = summary.failed,
                        cancelled = summary.cancelled,
                        "sweep finished"
                    );
                    if summary.cancelled {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "sweep failed"),
            }
        }

        tracing::info!("auto-like scheduler stopped");
    }
}
