/// In-memory fakes for the pipeline's injected collaborators
use async_trait::async_trait;
use atsume::modules::catalog::domain::{
    AnimePartial, AnimeRecord, CatalogStore, EpisodePartial, EpisodeRecord, EpisodeStub,
};
use atsume::modules::enrichment::{Enricher, EnrichmentData};
use atsume::modules::jobs::domain::{
    JobQueue, JobSpec, JobStats, JobStatus, RetryDisposition, ScrapeJob,
};
use atsume::modules::notify::{JobEvent, ProgressPublisher};
use atsume::modules::scraper::{SourceAdapter, SourceKind};
use atsume::shared::utils::RetryPolicy;
use atsume::shared::errors::{AppError, AppResult};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

// ================================================================================================
// SCRIPTED SOURCE ADAPTER
// ================================================================================================

/// One scripted response. Cloneable so the last entry can repeat forever.
#[derive(Clone)]
pub enum Scripted<T: Clone> {
    Ok(T),
    NotFound,
    Transient,
}

impl<T: Clone> Scripted<T> {
    fn to_result(&self, slug: &str) -> AppResult<T> {
        match self {
            Scripted::Ok(value) => Ok(value.clone()),
            Scripted::NotFound => Err(AppError::NotFound(format!("no such content: {}", slug))),
            Scripted::Transient => Err(AppError::Transient(format!("fetch broke: {}", slug))),
        }
    }
}

type ScriptMap<T> = Mutex<HashMap<String, VecDeque<Scripted<T>>>>;

/// Source adapter whose responses are scripted per slug. Responses are
/// consumed in order; the last one repeats.
pub struct ScriptedAdapter {
    kind: SourceKind,
    titles: ScriptMap<AnimePartial>,
    episode_lists: ScriptMap<Vec<EpisodeStub>>,
    episodes: ScriptMap<EpisodePartial>,
    pub title_calls: Mutex<Vec<String>>,
    pub episode_calls: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            titles: Mutex::new(HashMap::new()),
            episode_lists: Mutex::new(HashMap::new()),
            episodes: Mutex::new(HashMap::new()),
            title_calls: Mutex::new(Vec::new()),
            episode_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script_title(&self, slug: &str, response: Scripted<AnimePartial>) {
        self.titles
            .lock()
            .unwrap()
            .entry(slug.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn script_episode_list(&self, slug: &str, response: Scripted<Vec<EpisodeStub>>) {
        self.episode_lists
            .lock()
            .unwrap()
            .entry(slug.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn script_episode(&self, slug: &str, response: Scripted<EpisodePartial>) {
        self.episodes
            .lock()
            .unwrap()
            .entry(slug.to_string())
            .or_default()
            .push_back(response);
    }

    fn next<T: Clone>(map: &ScriptMap<T>, slug: &str) -> AppResult<T> {
        let mut map = map.lock().unwrap();
        match map.get_mut(slug) {
            Some(queue) if !queue.is_empty() => {
                let scripted = if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().unwrap().clone()
                };
                scripted.to_result(slug)
            }
            _ => Err(AppError::NotFound(format!("no such content: {}", slug))),
        }
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_title(&self, slug: &str) -> AppResult<AnimePartial> {
        self.title_calls.lock().unwrap().push(slug.to_string());
        Self::next(&self.titles, slug)
    }

    async fn fetch_episode_list(&self, title_slug: &str) -> AppResult<Vec<EpisodeStub>> {
        Self::next(&self.episode_lists, title_slug)
    }

    async fn fetch_episode(&self, episode_slug: &str) -> AppResult<EpisodePartial> {
        self.episode_calls
            .lock()
            .unwrap()
            .push(episode_slug.to_string());
        Self::next(&self.episodes, episode_slug)
    }
}

// ================================================================================================
// ENRICHER FAKE
// ================================================================================================

pub enum EnricherScript {
    Found(EnrichmentData),
    Nothing,
    Broken,
}

pub struct FakeEnricher {
    script: EnricherScript,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeEnricher {
    pub fn new(script: EnricherScript) -> Self {
        Self {
            script,
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Enricher for FakeEnricher {
    async fn lookup(&self, title: &str) -> AppResult<Option<EnrichmentData>> {
        self.lookups.lock().unwrap().push(title.to_string());
        match &self.script {
            EnricherScript::Found(data) => Ok(Some(data.clone())),
            EnricherScript::Nothing => Ok(None),
            EnricherScript::Broken => {
                Err(AppError::Transient("metadata service down".to_string()))
            }
        }
    }
}

// ================================================================================================
// IN-MEMORY CATALOG STORE
// ================================================================================================

/// Catalog store over hash maps, honoring the same upsert keys as the real
/// one: anime on slug, episodes on (anime_id, episode_number). Gap-fill
/// update semantics match the diesel changesets: absent fields never erase
/// stored values.
#[derive(Default)]
pub struct InMemoryCatalog {
    anime: Mutex<HashMap<Uuid, AnimeRecord>>,
    episodes: Mutex<HashMap<(Uuid, i32), EpisodeRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anime_count(&self) -> usize {
        self.anime.lock().unwrap().len()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.lock().unwrap().len()
    }

    pub fn insert_anime(&self, record: AnimeRecord) {
        self.anime.lock().unwrap().insert(record.id, record);
    }

    fn apply_partial(record: &mut AnimeRecord, partial: &AnimePartial) {
        record.title = partial.title.clone();
        if partial.japanese_title.is_some() {
            record.japanese_title = partial.japanese_title.clone();
        }
        if partial.synopsis.is_some() {
            record.synopsis = partial.synopsis.clone();
        }
        if partial.rating.is_some() {
            record.rating = partial.rating;
        }
        if partial.anime_type.is_some() {
            record.anime_type = partial.anime_type;
        }
        if partial.status.is_some() {
            record.status = partial.status;
        }
        if partial.episode_count.is_some() {
            record.episode_count = partial.episode_count;
        }
        if partial.duration.is_some() {
            record.duration = partial.duration.clone();
        }
        if partial.release_date.is_some() {
            record.release_date = partial.release_date.clone();
        }
        if partial.studio.is_some() {
            record.studio = partial.studio.clone();
        }
        if !partial.genres.is_empty() {
            record.genres = partial.genres.clone();
        }
        if partial.mal_id.is_some() {
            record.mal_id = partial.mal_id;
        }
        if partial.otakudesu_url.is_some() {
            record.otakudesu_url = partial.otakudesu_url.clone();
        }
        if partial.anoboy_url.is_some() {
            record.anoboy_url = partial.anoboy_url.clone();
        }
        record.updated_at = Utc::now();
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn upsert_anime(&self, partial: &AnimePartial) -> AppResult<AnimeRecord> {
        let mut anime = self.anime.lock().unwrap();
        let existing = anime
            .values_mut()
            .find(|record| record.slug == partial.slug);

        let record = match existing {
            Some(record) => {
                Self::apply_partial(record, partial);
                record.clone()
            }
            None => {
                let now = Utc::now();
                let mut record = AnimeRecord {
                    id: Uuid::new_v4(),
                    slug: partial.slug.clone(),
                    title: partial.title.clone(),
                    japanese_title: None,
                    synopsis: None,
                    rating: None,
                    anime_type: None,
                    status: None,
                    episode_count: None,
                    duration: None,
                    release_date: None,
                    studio: None,
                    genres: Vec::new(),
                    mal_id: None,
                    otakudesu_url: None,
                    anoboy_url: None,
                    created_at: now,
                    updated_at: now,
                };
                Self::apply_partial(&mut record, partial);
                anime.insert(record.id, record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn upsert_episode(
        &self,
        anime_id: Uuid,
        partial: &EpisodePartial,
    ) -> AppResult<EpisodeRecord> {
        if self.anime.lock().unwrap().get(&anime_id).is_none() {
            return Err(AppError::Persistence(format!(
                "anime {} does not exist",
                anime_id
            )));
        }
        let mut episodes = self.episodes.lock().unwrap();
        let key = (anime_id, partial.episode_number);
        let now = Utc::now();
        let record = episodes
            .entry(key)
            .and_modify(|record| {
                if partial.title.is_some() {
                    record.title = partial.title.clone();
                }
                record.slug = Some(partial.slug.clone());
                if partial.otakudesu_url.is_some() {
                    record.otakudesu_url = partial.otakudesu_url.clone();
                }
                if partial.anoboy_url.is_some() {
                    record.anoboy_url = partial.anoboy_url.clone();
                }
                record.updated_at = now;
            })
            .or_insert_with(|| EpisodeRecord {
                id: Uuid::new_v4(),
                anime_id,
                episode_number: partial.episode_number,
                title: partial.title.clone(),
                slug: Some(partial.slug.clone()),
                duration: partial.duration.clone(),
                air_date: partial.air_date.clone(),
                otakudesu_url: partial.otakudesu_url.clone(),
                anoboy_url: partial.anoboy_url.clone(),
                download_links: partial.download_links.clone(),
                streaming_links: partial.streaming_links.clone(),
                created_at: now,
                updated_at: now,
            })
            .clone();
        Ok(record)
    }

    async fn upsert_episodes(
        &self,
        anime_id: Uuid,
        partials: &[EpisodePartial],
    ) -> AppResult<usize> {
        for partial in partials {
            self.upsert_episode(anime_id, partial).await?;
        }
        Ok(partials.len())
    }

    async fn get_anime_by_id(&self, id: Uuid) -> AppResult<Option<AnimeRecord>> {
        Ok(self.anime.lock().unwrap().get(&id).cloned())
    }

    async fn get_anime_by_slug(&self, slug: &str) -> AppResult<Option<AnimeRecord>> {
        Ok(self
            .anime
            .lock()
            .unwrap()
            .values()
            .find(|record| record.slug == slug)
            .cloned())
    }

    async fn episodes_for_anime(&self, anime_id: Uuid) -> AppResult<Vec<EpisodeRecord>> {
        let mut records: Vec<EpisodeRecord> = self
            .episodes
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.anime_id == anime_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.episode_number);
        Ok(records)
    }

    async fn delete_anime(&self, id: Uuid) -> AppResult<()> {
        self.anime.lock().unwrap().remove(&id);
        self.episodes
            .lock()
            .unwrap()
            .retain(|(anime_id, _), _| *anime_id != id);
        Ok(())
    }
}

// ================================================================================================
// IN-MEMORY JOB QUEUE
// ================================================================================================

/// Queue over a hash map with the same transition rules as the database
/// implementation. `respect_run_at: false` lets retry tests run without
/// waiting out the real backoff; the delay each requeue asked for is kept in
/// `backoff_log`.
pub struct InMemoryQueue {
    jobs: Mutex<HashMap<Uuid, ScrapeJob>>,
    policy: RetryPolicy,
    respect_run_at: bool,
    complete_failures: Mutex<usize>,
    pub progress_log: Mutex<Vec<(Uuid, i32)>>,
    pub backoff_log: Mutex<Vec<Duration>>,
}

impl InMemoryQueue {
    pub fn new(policy: RetryPolicy, respect_run_at: bool) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            policy,
            respect_run_at,
            complete_failures: Mutex::new(0),
            progress_log: Mutex::new(Vec::new()),
            backoff_log: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `count` calls to `complete` fail with a persistence
    /// error, simulating a job-store outage at the terminal write
    pub fn fail_next_completes(&self, count: usize) {
        *self.complete_failures.lock().unwrap() = count;
    }

    pub fn job(&self, id: Uuid) -> Option<ScrapeJob> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    pub fn progress_values(&self, id: Uuid) -> Vec<i32> {
        self.progress_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(job_id, _)| *job_id == id)
            .map(|(_, progress)| *progress)
            .collect()
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, spec: &JobSpec) -> AppResult<ScrapeJob> {
        let now = Utc::now();
        let job = ScrapeJob {
            id: Uuid::new_v4(),
            spec: spec.clone(),
            priority: spec.priority(),
            status: JobStatus::Pending,
            progress: 0,
            attempts: 0,
            max_attempts: self.policy.max_attempts as i32,
            run_at: now,
            error: None,
            result: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        };
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(job)
    }

    async fn claim(&self) -> AppResult<Option<ScrapeJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let now = Utc::now();
        let candidate = jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending)
            .filter(|job| !self.respect_run_at || job.run_at <= now)
            .min_by_key(|job| (job.priority, job.created_at))
            .map(|job| job.id);

        let Some(id) = candidate else {
            return Ok(None);
        };
        let job = jobs.get_mut(&id).ok_or_else(|| {
            AppError::Internal("claimed job vanished".to_string())
        })?;
        job.status = JobStatus::Processing;
        job.progress = 0;
        job.attempts += 1;
        job.started_at = Some(now);
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn update_progress(&self, id: Uuid, progress: i32) -> AppResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            if job.status == JobStatus::Processing {
                job.progress = progress;
                job.updated_at = Utc::now();
            }
        }
        self.progress_log.lock().unwrap().push((id, progress));
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> AppResult<()> {
        {
            let mut failures = self.complete_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(AppError::Persistence("job store write refused".to_string()));
            }
        }
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("job {}", id)))?;
        let now = Utc::now();
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.result = Some(result);
        job.error = None;
        job.completed_at = Some(now);
        job.updated_at = now;
        self.progress_log.lock().unwrap().push((id, 100));
        Ok(())
    }

    async fn fail_or_retry(
        &self,
        id: Uuid,
        error: &str,
        retryable: bool,
    ) -> AppResult<RetryDisposition> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("job {}", id)))?;
        let now = Utc::now();
        let exhausted = job.attempts >= job.max_attempts;

        if retryable && !exhausted {
            let delay = self.policy.delay_for_attempt(job.attempts as u32);
            self.backoff_log.lock().unwrap().push(delay);
            let run_at = now
                + ChronoDuration::from_std(delay)
                    .unwrap_or_else(|_| ChronoDuration::seconds(0));
            job.status = JobStatus::Pending;
            job.run_at = run_at;
            job.error = Some(error.to_string());
            job.updated_at = now;
            Ok(RetryDisposition::Requeued { run_at })
        } else {
            job.status = JobStatus::Failed;
            job.error = Some(error.to_string());
            job.completed_at = Some(now);
            job.updated_at = now;
            Ok(RetryDisposition::Failed)
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ScrapeJob>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<ScrapeJob>> {
        let mut jobs: Vec<ScrapeJob> = self.jobs.lock().unwrap().values().cloned().collect();
        jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        jobs.truncate(limit as usize);
        Ok(jobs)
    }

    async fn statistics(&self) -> AppResult<JobStats> {
        let jobs = self.jobs.lock().unwrap();
        let mut stats = JobStats::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    async fn reclaim_stalled(&self, stalled_after: ChronoDuration) -> AppResult<usize> {
        let mut jobs = self.jobs.lock().unwrap();
        let now = Utc::now();
        let cutoff = now - stalled_after;
        let mut touched = 0;
        for job in jobs.values_mut() {
            if job.status != JobStatus::Processing {
                continue;
            }
            let Some(started) = job.started_at else {
                continue;
            };
            if started >= cutoff {
                continue;
            }
            if job.attempts >= job.max_attempts {
                job.status = JobStatus::Failed;
                job.error = Some("Worker stalled with no attempt budget left".to_string());
                job.completed_at = Some(now);
            } else {
                job.status = JobStatus::Pending;
                job.run_at = now;
            }
            job.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn purge_terminal(&self, older_than: ChronoDuration) -> AppResult<usize> {
        let mut jobs = self.jobs.lock().unwrap();
        let cutoff = Utc::now() - older_than;
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        Ok(before - jobs.len())
    }
}

// ================================================================================================
// RECORDING PUBLISHER
// ================================================================================================

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<JobEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_updates(&self, id: Uuid) -> Vec<i32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JobEvent::JobUpdated {
                    job_id, progress, ..
                } if job_id == id => Some(progress),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProgressPublisher for RecordingPublisher {
    async fn publish(&self, event: &JobEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
