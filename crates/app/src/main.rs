use std::{sync::Arc, time::Duration};

use engine::BalanceCache;
use migration::{Migrator, MigratorTrait};
use settings::{Cache, Database};
use tokio::sync::mpsc;

mod settings;

const EVENT_QUEUE_CAPACITY: usize = 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgeting={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let mut builder = engine::Engine::builder()
        .database(db)
        .balance_ttl(Duration::from_secs(settings.ledger.ttl_seconds));
    if let Some(cache) = parse_cache(&settings.cache).await? {
        builder = builder.cache(cache);
    }
    let engine = Arc::new(builder.build().await?);

    let (events, intake) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    tasks.spawn(engine::events::run_intake(Arc::clone(&engine), intake));

    if let Some(server) = settings.server {
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, events, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    } else {
        tracing::warn!("no server settings, nothing feeds the event intake");
        drop(events);
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// `None` keeps the engine default (in-process cache).
async fn parse_cache(config: &Cache) -> Result<Option<Arc<dyn BalanceCache>>, BoxError> {
    match config {
        Cache::Memory => Ok(None),
        #[cfg(feature = "redis")]
        Cache::Redis { url } => {
            tracing::info!("using redis balance cache");
            let cache = engine::RedisBalanceCache::connect(url).await?;
            Ok(Some(Arc::new(cache)))
        }
        #[cfg(not(feature = "redis"))]
        Cache::Redis { .. } => {
            Err("redis cache configured but the binary was built without the `redis` feature".into())
        }
    }
}
