/// The scrape pipeline: everything that happens between a claimed job and its
/// terminal outcome.
///
/// All collaborators are injected; the pipeline owns no process-wide state.
/// Adapter errors are converted into fallback decisions here and never bubble
/// raw to the job store; only the terminal cause is recorded.
use crate::modules::catalog::domain::{
    AnimePartial, CatalogStore, EpisodePartial, SourceUrlField,
};
use crate::modules::enrichment::{merge_title, Enricher};
use crate::modules::jobs::domain::{JobQueue, JobSpec, JobStatus, ScrapeJob, ScrapeTarget};
use crate::modules::notify::{JobEvent, ProgressPublisher};
use crate::modules::scraper::{SourceAdapter, SourceKind};
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info, log_warn};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct ScrapePipeline {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    enricher: Arc<dyn Enricher>,
    store: Arc<dyn CatalogStore>,
    queue: Arc<dyn JobQueue>,
    publisher: Arc<dyn ProgressPublisher>,
}

/// Maps a handler's local checkpoints into a slice of the job's overall
/// progress range. A plain job spans the whole 0..=90 range; each batch item
/// gets a proportional slice so aggregate progress stays monotonic.
struct ProgressScope {
    job_id: Uuid,
    base: i32,
    span: i32,
}

impl ProgressScope {
    fn whole(job_id: Uuid) -> Self {
        Self {
            job_id,
            base: 0,
            span: 100,
        }
    }

    fn slice(job_id: Uuid, index: usize, total: usize) -> Self {
        let total = total.max(1) as i32;
        Self {
            job_id,
            base: (index as i32 * 100) / total,
            span: 100 / total,
        }
    }

    fn overall(&self, local: i32) -> i32 {
        // 100 is reserved for completion, written by the queue itself
        (self.base + local * self.span / 100).min(99)
    }
}

impl ScrapePipeline {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        enricher: Arc<dyn Enricher>,
        store: Arc<dyn CatalogStore>,
        queue: Arc<dyn JobQueue>,
        publisher: Arc<dyn ProgressPublisher>,
    ) -> Self {
        Self {
            adapters,
            enricher,
            store,
            queue,
            publisher,
        }
    }

    /// Run one claimed job to a result payload. The caller owns terminal
    /// bookkeeping; an Err from here has not touched the job row.
    pub async fn execute(&self, job: &ScrapeJob) -> AppResult<serde_json::Value> {
        let scope = ProgressScope::whole(job.id);
        match &job.spec {
            JobSpec::Title {
                target,
                source_hint,
            } => self.run_title(&scope, target, *source_hint).await,
            JobSpec::Episode {
                target,
                source_hint,
                parent_id,
            } => {
                self.run_episode(&scope, target, *source_hint, *parent_id)
                    .await
            }
            JobSpec::Batch { items } => self.run_batch(job.id, items).await,
        }
    }

    /// Adapters in the order they should be tried: the hinted source first,
    /// then the remaining defaults.
    fn fallback_order(&self, hint: Option<SourceKind>) -> Vec<&Arc<dyn SourceAdapter>> {
        let mut order: Vec<SourceKind> = Vec::new();
        if let Some(kind) = hint {
            order.push(kind);
        }
        for kind in SourceKind::DEFAULT_ORDER {
            if !order.contains(&kind) {
                order.push(kind);
            }
        }
        order
            .into_iter()
            .filter_map(|kind| self.adapters.iter().find(|a| a.kind() == kind))
            .collect()
    }

    async fn checkpoint(&self, scope: &ProgressScope, local: i32) -> AppResult<()> {
        let progress = scope.overall(local);
        self.queue.update_progress(scope.job_id, progress).await?;
        self.publisher
            .publish(&JobEvent::JobUpdated {
                job_id: scope.job_id,
                status: JobStatus::Processing,
                progress,
            })
            .await;
        Ok(())
    }

    async fn run_title(
        &self,
        scope: &ProgressScope,
        target: &ScrapeTarget,
        hint: Option<SourceKind>,
    ) -> AppResult<serde_json::Value> {
        self.checkpoint(scope, 10).await?;

        let (adapter, scraped) = self.fetch_title_with_fallback(target, hint).await?;
        self.checkpoint(scope, 30).await?;

        let stubs = adapter.fetch_episode_list(&target.slug).await?;
        self.checkpoint(scope, 50).await?;

        let enrichment = match self.enricher.lookup(&scraped.title).await {
            Ok(data) => data,
            Err(e) => {
                log_warn!("Enrichment unavailable for '{}': {}", scraped.title, e);
                None
            }
        };
        let enriched = enrichment.is_some();
        let merged = match &enrichment {
            Some(data) => merge_title(&scraped, data),
            None => scraped,
        };
        self.checkpoint(scope, 70).await?;

        let record = self.store.upsert_anime(&merged).await?;
        self.checkpoint(scope, 90).await?;

        let url_field = match adapter.kind() {
            SourceKind::Otakudesu => SourceUrlField::Otakudesu,
            SourceKind::Anoboy => SourceUrlField::Anoboy,
        };
        let partials: Vec<EpisodePartial> = stubs
            .iter()
            .map(|stub| stub.to_partial(url_field))
            .collect();
        let episodes_persisted = self.store.upsert_episodes(record.id, &partials).await?;

        log_info!(
            "Title '{}' persisted from {} with {} episodes",
            record.slug,
            adapter.kind(),
            episodes_persisted
        );
        Ok(json!({
            "anime_id": record.id,
            "slug": record.slug,
            "source": adapter.kind().to_string(),
            "episodes_persisted": episodes_persisted,
            "enriched": enriched,
        }))
    }

    async fn run_episode(
        &self,
        scope: &ProgressScope,
        target: &ScrapeTarget,
        hint: Option<SourceKind>,
        parent_id: Uuid,
    ) -> AppResult<serde_json::Value> {
        let parent = self
            .store
            .get_anime_by_id(parent_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Parent title {} does not exist", parent_id))
            })?;
        self.checkpoint(scope, 20).await?;

        let (adapter, partial) = self.fetch_episode_with_fallback(target, hint).await?;
        self.checkpoint(scope, 50).await?;

        let episode = self.store.upsert_episode(parent.id, &partial).await?;
        self.checkpoint(scope, 80).await?;

        log_info!(
            "Episode {} of '{}' persisted from {}",
            episode.episode_number,
            parent.slug,
            adapter.kind()
        );
        Ok(json!({
            "anime_id": parent.id,
            "episode_id": episode.id,
            "episode_number": episode.episode_number,
            "source": adapter.kind().to_string(),
        }))
    }

    /// Sub-items run strictly in sequence. The batch fails only when every
    /// item fails; otherwise per-item failures are collected in the result.
    async fn run_batch(
        &self,
        job_id: Uuid,
        items: &[JobSpec],
    ) -> AppResult<serde_json::Value> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "Batch job must contain at least one item".to_string(),
            ));
        }

        let mut outcomes = Vec::with_capacity(items.len());
        let mut succeeded = 0usize;
        let mut last_error: Option<AppError> = None;

        for (index, item) in items.iter().enumerate() {
            let scope = ProgressScope::slice(job_id, index, items.len());
            let outcome = match item {
                JobSpec::Title {
                    target,
                    source_hint,
                } => self.run_title(&scope, target, *source_hint).await,
                JobSpec::Episode {
                    target,
                    source_hint,
                    parent_id,
                } => {
                    self.run_episode(&scope, target, *source_hint, *parent_id)
                        .await
                }
                JobSpec::Batch { .. } => Err(AppError::Validation(
                    "Batch jobs cannot contain nested batches".to_string(),
                )),
            };

            match outcome {
                Ok(result) => {
                    succeeded += 1;
                    outcomes.push(json!({"index": index, "ok": true, "result": result}));
                }
                Err(e) => {
                    log_warn!("Batch item {} of job {} failed: {}", index, job_id, e);
                    outcomes.push(json!({"index": index, "ok": false, "error": e.to_string()}));
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            return Err(last_error.unwrap_or_else(|| {
                AppError::Internal("Batch produced no outcome".to_string())
            }));
        }

        Ok(json!({
            "items_total": items.len(),
            "items_succeeded": succeeded,
            "items": outcomes,
        }))
    }

    /// Every adapter returning NotFound means the content does not exist
    /// anywhere and the job fails terminally. If any adapter broke
    /// transiently a retry might still succeed, so the exhaustion is
    /// reported as transient instead.
    fn exhausted(slug: &str, saw_transient: bool) -> AppError {
        if saw_transient {
            AppError::Transient(format!("No source produced data: {}", slug))
        } else {
            AppError::ExhaustedSources(slug.to_string())
        }
    }

    async fn fetch_title_with_fallback(
        &self,
        target: &ScrapeTarget,
        hint: Option<SourceKind>,
    ) -> AppResult<(&Arc<dyn SourceAdapter>, AnimePartial)> {
        let mut saw_transient = false;
        for adapter in self.fallback_order(hint) {
            match adapter.fetch_title(&target.slug).await {
                Ok(partial) => return Ok((adapter, partial)),
                Err(AppError::NotFound(_)) => {
                    log_debug!("{} has no title '{}'", adapter.kind(), target.slug);
                }
                Err(e) => {
                    saw_transient = true;
                    log_warn!(
                        "{} failed for title '{}': {}",
                        adapter.kind(),
                        target.slug,
                        e
                    );
                }
            }
        }
        Err(Self::exhausted(&target.slug, saw_transient))
    }

    async fn fetch_episode_with_fallback(
        &self,
        target: &ScrapeTarget,
        hint: Option<SourceKind>,
    ) -> AppResult<(&Arc<dyn SourceAdapter>, EpisodePartial)> {
        let mut saw_transient = false;
        for adapter in self.fallback_order(hint) {
            match adapter.fetch_episode(&target.slug).await {
                Ok(partial) => return Ok((adapter, partial)),
                Err(AppError::NotFound(_)) => {
                    log_debug!("{} has no episode '{}'", adapter.kind(), target.slug);
                }
                Err(e) => {
                    saw_transient = true;
                    log_warn!(
                        "{} failed for episode '{}': {}",
                        adapter.kind(),
                        target.slug,
                        e
                    );
                }
            }
        }
        Err(Self::exhausted(&target.slug, saw_transient))
    }
}
