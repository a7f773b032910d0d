use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stylematch_api::{
    config::Config,
    db,
    routes::{create_router, AppState},
    services::{
        catalog::{CatalogSource, FixtureCatalog, ShoppingCatalog},
        vision::{FixtureVision, GeminiVision, VisionAnalyzer},
        InteractionLedger, QuotaGate, RecommendationEngine, SearchOrchestrator,
    },
    store::{MemoryStore, PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stylematch_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = if config.use_memory_store {
        warn!("Using in-memory store; records are lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = db::create_pool(&config.database_url)
            .await
            .context("Failed to connect to Postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        Arc::new(PgStore::new(pool))
    };

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let vision: Arc<dyn VisionAnalyzer> = if config.vision_api_key.is_empty() {
        warn!("VISION_API_KEY not set; using the fixture analyzer");
        Arc::new(FixtureVision::default())
    } else {
        Arc::new(GeminiVision::new(
            http_client.clone(),
            config.vision_api_url.clone(),
            config.vision_api_key.clone(),
        ))
    };

    let catalog: Arc<dyn CatalogSource> = if config.catalog_api_key.is_empty() {
        warn!("CATALOG_API_KEY not set; using the fixture catalog");
        Arc::new(FixtureCatalog)
    } else {
        let redis_client = db::create_redis_client(&config.redis_url)
            .context("Failed to create Redis client")?;
        Arc::new(ShoppingCatalog::new(
            http_client,
            db::Cache::new(redis_client),
            config.catalog_api_url.clone(),
            config.catalog_api_key.clone(),
        ))
    };

    let quota = Arc::new(QuotaGate::new(config.daily_search_limit, store.clone()));
    let recommendations = Arc::new(RecommendationEngine::new(
        store.clone(),
        catalog.clone(),
        config.feed_size,
    ));
    let search = Arc::new(SearchOrchestrator::new(
        vision,
        catalog,
        store.clone(),
        quota.clone(),
        recommendations.clone(),
    ));
    let ledger = Arc::new(InteractionLedger::new(store));

    let app = create_router(AppState {
        search,
        ledger,
        recommendations,
        quota,
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
