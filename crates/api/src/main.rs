use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hibor_core::config::Settings;
use hibor_core::refresh::{RefreshMode, RefreshScheduler, SharedSnapshot};
use hibor_core::storage::mongo::MongoRateStore;
use hibor_core::storage::{fetch_snapshot, RateStore};

mod page;
mod routes;

#[derive(Debug, Parser)]
#[command(name = "hibor_api")]
struct Args {
    /// Bind host. Overrides HOST.
    #[arg(long)]
    host: Option<String>,

    /// Bind port. Overrides PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Seconds between snapshot refreshes, 0 to never refresh. Overrides REFRESH_INTERVAL_SECS.
    #[arg(long)]
    refresh_interval_secs: Option<u64>,

    /// Fetch the snapshot once at startup and keep it for the life of the process.
    #[arg(long, conflicts_with = "refresh_interval_secs")]
    once: bool,

    /// Log at debug level when RUST_LOG is unset.
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.host = host;
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(secs) = self.refresh_interval_secs {
            settings.refresh_interval_secs = secs;
        }
        if self.once {
            settings.refresh_interval_secs = 0;
        }
        settings.debug |= self.debug;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut settings = Settings::from_env()?;
    args.apply(&mut settings);
    settings.validate()?;

    let _sentry_guard = init_sentry(&settings);

    let default_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    // Without a first snapshot there is nothing to serve.
    let store: Arc<dyn RateStore> = Arc::new(
        MongoRateStore::from_settings(&settings)
            .await
            .map_err(report_fatal)?,
    );
    let snapshot = fetch_snapshot(store.as_ref(), settings.fetch_limit)
        .await
        .context("initial rate snapshot fetch failed")
        .map_err(report_fatal)?;
    let shared = Arc::new(SharedSnapshot::new(snapshot));

    let mode = settings.refresh_mode();
    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let refresher = match mode {
        RefreshMode::Once => None,
        RefreshMode::Interval(every) => {
            let scheduler = RefreshScheduler::new(
                Arc::clone(&store),
                Arc::clone(&shared),
                every,
                settings.fetch_limit,
            );
            Some(tokio::spawn(scheduler.run(async move {
                let _ = stop_rx.changed().await;
            })))
        }
    };

    let state = routes::AppState {
        shared,
        mode,
        chart_row_limit: settings.chart_row_limit(),
    };

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, mode = mode.label(), "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop_tx.send(true);
    if let Some(handle) = refresher {
        let _ = handle.await;
    }

    Ok(())
}

fn report_fatal(err: anyhow::Error) -> anyhow::Error {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %format!("{err:#}"), "startup failed");
    err
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
