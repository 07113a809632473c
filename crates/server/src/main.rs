//! dein.shop server binary.
//!
//! Serves the public directory API and the admin API on one port.
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! ```bash
//! cargo run -p deinshop-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sentry::integrations::tracing as sentry_tracing;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deinshop_server::config::ServerConfig;
use deinshop_server::middleware::MemoryRateLimitStore;
use deinshop_server::services::notifier::{DeliverySettings, drain};
use deinshop_server::services::{EmailQueue, EmailService, LogOnlyNotifier, Notifier};
use deinshop_server::{AppState, app, db};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &ServerConfig) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deinshop_server=info,tower_http=debug".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// How long shutdown waits for queued emails to go out.
const NOTIFIER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

type NotifierParts = (Arc<dyn Notifier>, Option<JoinHandle<()>>);

/// Pick the notifier: SMTP delivery when configured, otherwise log and drop.
///
/// Returns the delivery worker alongside, if one was started.
fn build_notifier(config: &ServerConfig) -> Result<NotifierParts, Box<dyn std::error::Error>> {
    let Some(email_config) = &config.email else {
        tracing::warn!("SMTP not configured, submitter feedback emails are disabled");
        return Ok((Arc::new(LogOnlyNotifier), None));
    };

    let mailer = EmailService::new(email_config, &config.site_url, config.outbound_timeout)?;
    let (queue, worker) =
        EmailQueue::spawn(mailer, DeliverySettings::with_timeout(config.outbound_timeout));
    tracing::info!(smtp_host = %email_config.smtp_host, "Email delivery enabled");
    Ok((Arc::new(queue), Some(worker)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env()?;

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    let (notifier, notification_worker) = build_notifier(&config)?;
    let rate_limits = Arc::new(MemoryRateLimitStore::new());
    let addr = config.socket_addr();
    let state = AppState::new(config, pool, notifier, rate_limits)?;

    let app = app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router and its queue handle are gone now, so the worker ends once
    // the queue is empty.
    if let Some(worker) = notification_worker
        && drain(worker, NOTIFIER_DRAIN_TIMEOUT).await
    {
        tracing::info!("Notification queue drained");
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
