use crate::utils::fakes::{
    EnricherScript, FakeEnricher, InMemoryCatalog, InMemoryQueue, RecordingPublisher,
    ScriptedAdapter,
};
use atsume::modules::catalog::domain::{AnimePartial, CatalogStore, EpisodeStub};
use atsume::modules::enrichment::Enricher;
use atsume::modules::jobs::domain::{JobQueue, JobSpec, ScrapeJob, ScrapeTarget};
use atsume::modules::notify::ProgressPublisher;
use atsume::modules::jobs::{ScrapePipeline, WorkerPool};
use atsume::modules::scraper::{SourceAdapter, SourceKind};
use atsume::shared::utils::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The whole pipeline wired over fakes
pub struct Harness {
    pub otakudesu: Arc<ScriptedAdapter>,
    pub anoboy: Arc<ScriptedAdapter>,
    pub enricher: Arc<FakeEnricher>,
    pub store: Arc<InMemoryCatalog>,
    pub queue: Arc<InMemoryQueue>,
    pub publisher: Arc<RecordingPublisher>,
    pub pipeline: Arc<ScrapePipeline>,
}

pub fn build_harness(enricher_script: EnricherScript) -> Harness {
    let otakudesu = Arc::new(ScriptedAdapter::new(SourceKind::Otakudesu));
    let anoboy = Arc::new(ScriptedAdapter::new(SourceKind::Anoboy));
    let enricher = Arc::new(FakeEnricher::new(enricher_script));
    let store = Arc::new(InMemoryCatalog::new());
    let queue = Arc::new(InMemoryQueue::new(RetryPolicy::default(), false));
    let publisher = Arc::new(RecordingPublisher::new());

    let adapters: Vec<Arc<dyn SourceAdapter>> =
        vec![otakudesu.clone(), anoboy.clone()];
    let pipeline = Arc::new(ScrapePipeline::new(
        adapters,
        enricher.clone() as Arc<dyn Enricher>,
        store.clone() as Arc<dyn CatalogStore>,
        queue.clone() as Arc<dyn JobQueue>,
        publisher.clone() as Arc<dyn ProgressPublisher>,
    ));

    Harness {
        otakudesu,
        anoboy,
        enricher,
        store,
        queue,
        publisher,
        pipeline,
    }
}

impl Harness {
    pub fn worker_pool(&self, concurrency: usize) -> WorkerPool {
        WorkerPool::new(
            self.queue.clone() as Arc<dyn JobQueue>,
            Arc::clone(&self.pipeline),
            self.publisher.clone() as Arc<dyn ProgressPublisher>,
            concurrency,
            Duration::from_millis(10),
            Duration::from_secs(30),
        )
    }

    /// Enqueue a spec and claim it, the way a worker receives work
    pub async fn claimed_job(&self, spec: JobSpec) -> ScrapeJob {
        self.queue.enqueue(&spec).await.unwrap();
        self.queue.claim().await.unwrap().unwrap()
    }
}

pub fn title_spec(slug: &str, hint: Option<SourceKind>) -> JobSpec {
    JobSpec::Title {
        target: ScrapeTarget {
            url: format!("https://otakudesu.best/anime/{}", slug),
            slug: slug.to_string(),
        },
        source_hint: hint,
    }
}

pub fn episode_spec(slug: &str, hint: Option<SourceKind>, parent_id: Uuid) -> JobSpec {
    JobSpec::Episode {
        target: ScrapeTarget {
            url: format!("https://otakudesu.best/episode/{}", slug),
            slug: slug.to_string(),
        },
        source_hint: hint,
        parent_id,
    }
}

pub fn title_partial(slug: &str, title: &str) -> AnimePartial {
    AnimePartial {
        slug: slug.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

pub fn episode_stubs(slug: &str, numbers: &[i32]) -> Vec<EpisodeStub> {
    numbers
        .iter()
        .map(|n| EpisodeStub {
            episode_number: *n,
            title: Some(format!("Episode {}", n)),
            slug: format!("{}-episode-{}", slug, n),
            url: format!("https://otakudesu.best/episode/{}-episode-{}", slug, n),
        })
        .collect()
}

/// Run the pool until the job is terminal (or the deadline passes), then
/// drain the workers.
pub async fn run_pool_until_terminal(harness: &Harness, pool: WorkerPool, job_id: Uuid) {
    let shutdown = pool.shutdown_handle();
    let queue = Arc::clone(&harness.queue);
    let watcher = tokio::spawn(async move {
        for _ in 0..500 {
            if let Some(job) = queue.job(job_id) {
                if job.status.is_terminal() {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
    });
    pool.run().await;
    watcher.await.unwrap();
}
