mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::{Context, Result};
use clap::Parser;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use warren_core::{InstanceIndexSource, KeyValueStore};
use warren_gateway::{App, AppState};
use warren_slugs::{HashidsSlugifier, SlugRegistry, UrlRegistry};
use warren_storage::{InMemoryStore, RedisStore, TracedStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CLI::parse();

    let telemetry =
        warren_telemetry::init(&config.telemetry_settings()).context("failed to initialise telemetry")?;

    let shutdown_timeout = Duration::try_from(config.shutdown_timeout)
        .context("shutdown timeout must not be negative")?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        slugs_min_length = config.slugs_min_length,
        trace_storage = config.trace_storage,
        log_requests = config.log_requests,
        log_elapsed_time = config.log_elapsed_time,
        span_export = telemetry.is_exporting(),
        "starting warren"
    );

    let slugs_settings = config.slugs_settings();
    let slugifier =
        HashidsSlugifier::new(&slugs_settings).context("failed to configure the slug encoder")?;
    let slug_min_length = slugifier.min_length();

    let registry = match config.storage {
        StorageBackendArg::InMemory => {
            build_registry(slugifier, Arc::new(InMemoryStore::new()), config.trace_storage).await?
        }
        StorageBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when storage backend is redis")?;
            let store = RedisStore::connect(redis_url)
                .await
                .context("failed to connect to Redis")?
                .with_prefix(config.redis_key_prefix.clone())
                .with_instance_index_key(config.redis_instance_index_key.clone());
            build_registry(slugifier, Arc::new(store), config.trace_storage).await?
        }
    };

    let mut state = AppState::new(registry, slug_min_length);
    if let Some(base_url) = config.public_base_url.as_deref() {
        state = state.with_public_base_url(base_url);
    }

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "serving http");

    let app = App::router_with_options(state, config.router_options());
    serve(listener, app, shutdown_timeout).await?;

    info!("warren shut down");
    Ok(())
}

/// Obtains this instance's index once and builds the registry on top of `store`.
async fn build_registry<K>(
    slugifier: HashidsSlugifier,
    store: K,
    trace_storage: bool,
) -> Result<Arc<dyn UrlRegistry>>
where
    K: KeyValueStore + InstanceIndexSource + Clone,
{
    if trace_storage {
        let store = TracedStore::new(store);
        let registry = SlugRegistry::bootstrap(slugifier, store.clone(), &store)
            .await
            .context("failed to obtain an instance index")?;
        return Ok(Arc::new(registry));
    }

    let registry = SlugRegistry::bootstrap(slugifier, store.clone(), &store)
        .await
        .context("failed to obtain an instance index")?;
    Ok(Arc::new(registry))
}

/// Serves until a shutdown signal arrives, then gives in-flight requests
/// `shutdown_timeout` to complete.
async fn serve(listener: TcpListener, app: axum::Router, shutdown_timeout: Duration) -> Result<()> {
    let shutdown = Arc::new(Notify::new());

    let server = axum::serve(listener, app).with_graceful_shutdown({
        let shutdown = Arc::clone(&shutdown);
        async move { shutdown.notified().await }
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server => {
            return result.context("server task failed")?.context("server error");
        }
        _ = shutdown_signal() => {}
    }

    info!(timeout = ?shutdown_timeout, "shutting down gracefully");
    shutdown.notify_one();

    match tokio::time::timeout(shutdown_timeout, &mut server).await {
        Ok(result) => result.context("server task failed")?.context("server error"),
        Err(_) => {
            warn!("graceful shutdown timed out, dropping open connections");
            server.abort();
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
