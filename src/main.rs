use anyhow::Context;
use atsume::modules::catalog::infrastructure::CatalogStoreImpl;
use atsume::modules::enrichment::{JikanClient, JikanEnricher};
use atsume::modules::jobs::{PgJobQueue, ScrapePipeline, WorkerPool};
use atsume::modules::notify::{LogPublisher, ProgressPublisher, WebhookPublisher};
use atsume::modules::scraper::{AnoboyAdapter, OtakudesuAdapter, SourceAdapter};
use atsume::shared::utils::logger::init_logger;
use atsume::shared::{AppConfig, Database, RetryPolicy};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let database = Database::new(&config.database_url).context("Failed to connect to database")?;

    {
        let mut conn = database
            .get_connection()
            .context("Failed to get migration connection")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    }

    let pool = database.pool().clone();
    let queue = Arc::new(PgJobQueue::new(pool.clone(), RetryPolicy::default()));
    let store = Arc::new(CatalogStoreImpl::new(pool));

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(OtakudesuAdapter::new(config.otakudesu_base_url.clone())?),
        Arc::new(AnoboyAdapter::new(config.anoboy_base_url.clone())?),
    ];
    let enricher = Arc::new(JikanEnricher::new(JikanClient::new(
        config.jikan_base_url.clone(),
    )?));

    let publisher: Arc<dyn ProgressPublisher> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookPublisher::new(url.clone())?),
        None => Arc::new(LogPublisher),
    };

    let pipeline = Arc::new(ScrapePipeline::new(
        adapters,
        enricher,
        store,
        queue.clone(),
        publisher.clone(),
    ));
    let workers = WorkerPool::new(
        queue,
        pipeline,
        publisher,
        config.worker_concurrency,
        config.poll_interval,
        config.attempt_timeout,
    );

    let shutdown = workers.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown signal received, draining workers");
            shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    workers.run().await;
    Ok(())
}
