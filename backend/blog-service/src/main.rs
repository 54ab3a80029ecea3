use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use blog_service::cache::{MemoryPageCache, PageCache, RedisPageCache};
use blog_service::config::{CacheBackend, Config, LogFormat, StoreBackend};
use blog_service::handlers::{configure_routes, not_found};
use blog_service::middleware::{JwtKeys, ViewerMiddleware};
use blog_service::pagination::Paginator;
use blog_service::store::{ContentStore, MemoryContentStore, PgContentStore};
use blog_service::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,blog_service=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

async fn build_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("DATABASE_URL environment variable not set")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!("Database pool created");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations completed");

            Ok(Arc::new(PgContentStore::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory content store; data is lost on restart");
            Ok(Arc::new(MemoryContentStore::new()))
        }
    }
}

async fn build_page_cache(config: &Config) -> Result<Arc<dyn PageCache>> {
    let ttl_secs = config.cache.page_ttl_secs;
    match config.cache.backend {
        CacheBackend::Redis => {
            let client = redis::Client::open(config.cache.url.as_str())
                .context("Failed to create Redis client")?;
            let manager = redis::aio::ConnectionManager::new(client)
                .await
                .context("Failed to connect to Redis")?;
            info!("Redis connection established");

            Ok(Arc::new(RedisPageCache::new(manager, ttl_secs)))
        }
        CacheBackend::Memory => Ok(Arc::new(MemoryPageCache::new(Duration::from_secs(
            ttl_secs,
        )))),
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    init_tracing(config.app.log_format);
    info!(env = %config.app.env, "Starting blog-service");

    let store = build_store(&config).await?;
    let page_cache = build_page_cache(&config).await?;
    let paginator = Paginator::new(config.feed.posts_per_page);

    let state = web::Data::new(AppState::new(store, page_cache, paginator));
    let keys = Arc::new(
        JwtKeys::from_secret(&config.auth.jwt_secret).with_token_ttl(config.auth.token_ttl_secs),
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!("HTTP server listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::Data::from(keys.clone()))
            .wrap(ViewerMiddleware::new(keys.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure_routes)
            .default_service(web::to(not_found))
    })
    .bind(&bind_address)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("blog-service stopped");
    Ok(())
}
