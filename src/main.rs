use std::{process, sync::Arc};

use recache::{
    application::{
        error::AppError,
        records::{CollaboratorHealth, RecordService},
        repos::{CacheStore, DocumentStore},
    },
    cache::{CacheConfig, MemoryCacheStore},
    config::{self, CacheBackend, CacheSettings, Command, DatabaseBackend, DatabaseSettings},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        memory::InMemoryDocumentStore,
        redis_store::{RedisCacheStore, redact_url},
        telemetry,
    },
};
use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(err.to_string()))?;

    let command = cli_args.command.unwrap_or_default();

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        Command::Serve(_) => run_serve(settings).await,
        Command::Check(_) => run_check(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = open_document_store(&settings.database, true).await?;
    let cache = open_cache_store(&settings.cache)?;
    let service = RecordService::new(store, cache, CacheConfig::from(&settings.cache));

    // Unreachable collaborators are reported, not fatal: requests fail or
    // bypass the cache until they come back.
    log_health(&service.health().await);

    let router = http::build_router(ApiState::new(service), settings.server.max_body_bytes);
    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        addr = %settings.server.addr,
        document_store = %settings.database.backend,
        cache_store = %settings.cache.backend,
        cache_ttl_secs = settings.cache.ttl.as_secs(),
        "recache listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!("recache stopped");
    Ok(())
}

async fn run_check(settings: config::Settings) -> Result<(), AppError> {
    let store = open_document_store(&settings.database, false).await?;
    let cache = open_cache_store(&settings.cache)?;
    let service = RecordService::new(store, cache, CacheConfig::from(&settings.cache));

    let health = service.health().await;
    log_health(&health);

    if health.is_healthy() {
        Ok(())
    } else {
        Err(AppError::unexpected("collaborator check failed"))
    }
}

async fn open_document_store(
    settings: &DatabaseSettings,
    migrate: bool,
) -> Result<Arc<dyn DocumentStore>, AppError> {
    match &settings.backend {
        DatabaseBackend::Postgres { url } => {
            let pool = PostgresRepositories::connect_lazy(url, settings.max_connections.get())
                .map_err(InfraError::from)?;
            if migrate {
                PostgresRepositories::run_migrations(&pool)
                    .await
                    .map_err(InfraError::from)?;
                info!("database migrations applied");
            }
            Ok(Arc::new(PostgresRepositories::new(pool)))
        }
        DatabaseBackend::Memory => {
            warn!("document store is in-process; records are lost on exit");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}

fn open_cache_store(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, AppError> {
    match &settings.backend {
        CacheBackend::Redis { url } => {
            let store = RedisCacheStore::open(url).map_err(InfraError::from)?;
            info!(url = %redact_url(url), "redis cache store configured");
            Ok(Arc::new(store))
        }
        CacheBackend::Memory => Ok(Arc::new(MemoryCacheStore::new(&CacheConfig::from(
            settings,
        )))),
    }
}

fn log_health(health: &CollaboratorHealth) {
    match &health.document_store {
        Ok(()) => info!("document store reachable"),
        Err(err) => error!(error = %err, "document store unreachable"),
    }
    match &health.cache_store {
        Ok(()) => info!("cache store reachable"),
        Err(err) => warn!(error = %err, "cache store unreachable; serving from the document store"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
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

    info!("shutdown signal received");
}
