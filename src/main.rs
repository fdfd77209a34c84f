use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use autolike::application::usecases::SweepOnceUseCase;
use autolike::application::{
    LikeClient, LikeNotifier, MutationGateway, Scheduler, SchedulerConfig,
};
use autolike::domain::CooldownPolicy;
use autolike::infrastructure::{
    console_notifier::ConsoleNotifier, fake_client::FakeLikeClient,
    http_like_client::HttpLikeClient, json_store::JsonSnapshotStore,
    multi_notifier::MultiNotifier, webhook_notifier::WebhookNotifier,
};
use autolike::interfaces::config::Config;
use autolike::interfaces::http_api::{build_router, ApiState};

#[derive(Parser, Debug)]
#[command(name = "autolike")]
struct Args {
    /// Path to config.yaml
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Run one sweep and exit
    #[arg(long)]
    once: bool,

    /// Do not call the real like API (fake client, console output only)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("autolike=info".parse().unwrap()),
        )
        .init();
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let cfg = match Config::load_from_file(&args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // 1) store + gateway
    let store = Arc::new(JsonSnapshotStore::new(cfg.state_file()));
    let gateway = Arc::new(MutationGateway::new(
        store,
        cfg.new_entries_start_on_cooldown(),
    ));

    // 2) like client
    let client: Arc<dyn LikeClient> = if args.dry_run {
        tracing::warn!("--dry-run enabled: no remote like calls will be made");
        Arc::new(FakeLikeClient::new())
    } else {
        let api_base = match std::env::var("API_URL").ok().or(cfg.api_base_url.clone()) {
            Some(url) => url,
            None => {
                tracing::error!("API_URL env or api_base_url config is required");
                std::process::exit(1);
            }
        };
        let timeout = Duration::from_secs(cfg.request_timeout_seconds());
        match HttpLikeClient::new(api_base, timeout, cfg.probe_before_like()) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!("Failed to build like client: {e}");
                std::process::exit(1);
            }
        }
    };

    // 3) notifiers fanout
    let mut notifiers: Vec<Box<dyn LikeNotifier>> = vec![Box::new(ConsoleNotifier::new())];
    if !args.dry_run {
        if let Ok(hook) = std::env::var("LIKE_WEBHOOK") {
            notifiers.push(Box::new(WebhookNotifier::new(hook)));
        } else {
            tracing::warn!("LIKE_WEBHOOK not set, webhook notifier disabled");
        }
    }
    let notifier: Arc<dyn LikeNotifier> = Arc::new(MultiNotifier::new(notifiers));

    let policy = CooldownPolicy::new(cfg.cooldown_seconds());
    let pace = Duration::from_millis(cfg.pace_ms());

    // 4) run
    if args.once {
        let cancel = tokio_util::sync::CancellationToken::new();
        let sweep = SweepOnceUseCase {
            gateway: &gateway,
            client: client.as_ref(),
            notifier: notifier.as_ref(),
            policy,
            pace,
            cancel: &cancel,
        };
        match sweep.execute().await {
            Ok(summary) => tracing::info!(?summary, "sweep completed"),
            Err(e) => {
                tracing::error!("Sweep failed: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let scheduler = Scheduler::new(
        gateway.clone(),
        client,
        notifier,
        SchedulerConfig {
            sweep_interval: Duration::from_secs(cfg.sweep_interval_seconds()),
            cooldown_seconds: cfg.cooldown_seconds(),
            pace,
        },
    );
    let handle = scheduler.start();

    // 5) optional admin API for the presentation layer
    if let Some(addr) = cfg.http_listen.clone() {
        let router = build_router(ApiState {
            gateway: gateway.clone(),
            policy,
            api_token: cfg.api_token.clone(),
        });
        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Failed to bind admin API on {addr}: {e}");
                    return;
                }
            };
            tracing::info!(%addr, "admin API listening");
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Admin API server error: {e}");
            }
        });
    }

    // block until ctrl-c, then let the sweep persist partial progress
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
    handle.stop().await;
}
