/// Store trait for persisted catalog content (titles and episodes).
///
/// Every write is an idempotent upsert: titles conflict on `slug`, episodes on
/// the (`anime_id`, `episode_number`) composite key. Retried jobs re-run the
/// whole pipeline, so repeated writes with the same input must converge on the
/// same rows.
use crate::modules::catalog::domain::anime::{AnimePartial, AnimeRecord};
use crate::modules::catalog::domain::episode::{EpisodePartial, EpisodeRecord};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert or update a title keyed on its slug
    async fn upsert_anime(&self, partial: &AnimePartial) -> AppResult<AnimeRecord>;

    /// Insert or update one episode keyed on (anime_id, episode_number)
    async fn upsert_episode(
        &self,
        anime_id: Uuid,
        partial: &EpisodePartial,
    ) -> AppResult<EpisodeRecord>;

    /// Upsert a batch of episodes for one title; returns the number written
    async fn upsert_episodes(
        &self,
        anime_id: Uuid,
        partials: &[EpisodePartial],
    ) -> AppResult<usize>;

    async fn get_anime_by_id(&self, id: Uuid) -> AppResult<Option<AnimeRecord>>;

    async fn get_anime_by_slug(&self, slug: &str) -> AppResult<Option<AnimeRecord>>;

    async fn episodes_for_anime(&self, anime_id: Uuid) -> AppResult<Vec<EpisodeRecord>>;

    /// Delete a title; its episodes go with it (schema-level cascade)
    async fn delete_anime(&self, id: Uuid) -> AppResult<()>;
}
