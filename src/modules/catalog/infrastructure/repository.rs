/// Diesel-based implementation of CatalogStore
///
/// All writes are upserts: anime conflicts on `slug`, episodes on the
/// (`anime_id`, `episode_number`) composite. Blocking diesel work runs on the
/// tokio blocking pool.
use crate::modules::catalog::domain::{
    AnimePartial, AnimeRecord, CatalogStore, EpisodePartial, EpisodeRecord,
};
use crate::modules::catalog::infrastructure::models::{
    AnimeChanges, AnimeModel, EpisodeChanges, EpisodeModel, NewAnime, NewEpisode,
};
use crate::schema::{anime, episodes};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::DbPool;
use async_trait::async_trait;
use diesel::prelude::*;
use tokio::task;
use uuid::Uuid;

pub struct CatalogStoreImpl {
    pool: DbPool,
}

impl CatalogStoreImpl {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn upsert_episode_blocking(
        conn: &mut PgConnection,
        anime_id: Uuid,
        partial: &EpisodePartial,
    ) -> AppResult<EpisodeModel> {
        let new_episode = NewEpisode::from_partial(anime_id, partial);
        let changes = EpisodeChanges::from_partial(partial);

        diesel::insert_into(episodes::table)
            .values(&new_episode)
            .on_conflict((episodes::anime_id, episodes::episode_number))
            .do_update()
            .set(&changes)
            .get_result::<EpisodeModel>(conn)
            .map_err(|e| AppError::Persistence(format!("Failed to upsert episode: {}", e)))
    }
}

#[async_trait]
impl CatalogStore for CatalogStoreImpl {
    async fn upsert_anime(&self, partial: &AnimePartial) -> AppResult<AnimeRecord> {
        let pool = self.pool.clone();
        let partial = partial.clone();

        let model = task::spawn_blocking(move || -> AppResult<AnimeModel> {
            let mut conn = pool.get()?;
            let new_anime = NewAnime::from_partial(&partial);
            let changes = AnimeChanges::from_partial(&partial);

            diesel::insert_into(anime::table)
                .values(&new_anime)
                .on_conflict(anime::slug)
                .do_update()
                .set(&changes)
                .get_result::<AnimeModel>(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to upsert anime: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        Ok(model.to_record())
    }

    async fn upsert_episode(
        &self,
        anime_id: Uuid,
        partial: &EpisodePartial,
    ) -> AppResult<EpisodeRecord> {
        let pool = self.pool.clone();
        let partial = partial.clone();

        let model = task::spawn_blocking(move || -> AppResult<EpisodeModel> {
            let mut conn = pool.get()?;
            Self::upsert_episode_blocking(&mut conn, anime_id, &partial)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        Ok(model.to_record())
    }

    async fn upsert_episodes(
        &self,
        anime_id: Uuid,
        partials: &[EpisodePartial],
    ) -> AppResult<usize> {
        let pool = self.pool.clone();
        let partials = partials.to_vec();

        task::spawn_blocking(move || -> AppResult<usize> {
            let mut conn = pool.get()?;
            let mut written = 0;
            for partial in &partials {
                Self::upsert_episode_blocking(&mut conn, anime_id, partial)?;
                written += 1;
            }
            Ok(written)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }

    async fn get_anime_by_id(&self, id: Uuid) -> AppResult<Option<AnimeRecord>> {
        let pool = self.pool.clone();

        let model = task::spawn_blocking(move || -> AppResult<Option<AnimeModel>> {
            let mut conn = pool.get()?;
            anime::table
                .find(id)
                .first::<AnimeModel>(&mut conn)
                .optional()
                .map_err(|e| AppError::Persistence(format!("Failed to get anime: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        Ok(model.map(AnimeModel::to_record))
    }

    async fn get_anime_by_slug(&self, slug: &str) -> AppResult<Option<AnimeRecord>> {
        let pool = self.pool.clone();
        let slug = slug.to_string();

        let model = task::spawn_blocking(move || -> AppResult<Option<AnimeModel>> {
            let mut conn = pool.get()?;
            anime::table
                .filter(anime::slug.eq(&slug))
                .first::<AnimeModel>(&mut conn)
                .optional()
                .map_err(|e| AppError::Persistence(format!("Failed to get anime by slug: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        Ok(model.map(AnimeModel::to_record))
    }

    async fn episodes_for_anime(&self, anime_id: Uuid) -> AppResult<Vec<EpisodeRecord>> {
        let pool = self.pool.clone();

        let models = task::spawn_blocking(move || -> AppResult<Vec<EpisodeModel>> {
            let mut conn = pool.get()?;
            episodes::table
                .filter(episodes::anime_id.eq(anime_id))
                .order(episodes::episode_number.asc())
                .load::<EpisodeModel>(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to load episodes: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        Ok(models.into_iter().map(EpisodeModel::to_record).collect())
    }

    async fn delete_anime(&self, id: Uuid) -> AppResult<()> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = pool.get()?;
            // Episodes are removed by the schema's ON DELETE CASCADE
            diesel::delete(anime::table.find(id))
                .execute(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to delete anime: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }
}
