/// Diesel models for the anime and episodes tables
use crate::modules::catalog::domain::{
    AnimePartial, AnimeRecord, AnimeStatus, AnimeType, DownloadLinks, EpisodePartial,
    EpisodeRecord, StreamingLinks,
};
use crate::schema::{anime, episodes};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[ExistingTypePath = "crate::schema::sql_types::AnimeStatus"]
pub enum AnimeStatusDb {
    Ongoing,
    Completed,
    Upcoming,
}

impl From<AnimeStatus> for AnimeStatusDb {
    fn from(value: AnimeStatus) -> Self {
        match value {
            AnimeStatus::Ongoing => AnimeStatusDb::Ongoing,
            AnimeStatus::Completed => AnimeStatusDb::Completed,
            AnimeStatus::Upcoming => AnimeStatusDb::Upcoming,
        }
    }
}

impl From<AnimeStatusDb> for AnimeStatus {
    fn from(value: AnimeStatusDb) -> Self {
        match value {
            AnimeStatusDb::Ongoing => AnimeStatus::Ongoing,
            AnimeStatusDb::Completed => AnimeStatus::Completed,
            AnimeStatusDb::Upcoming => AnimeStatus::Upcoming,
        }
    }
}

#[derive(diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[ExistingTypePath = "crate::schema::sql_types::AnimeType"]
pub enum AnimeTypeDb {
    Tv,
    Movie,
    Ova,
    Ona,
    Special,
}

impl From<AnimeType> for AnimeTypeDb {
    fn from(value: AnimeType) -> Self {
        match value {
            AnimeType::Tv => AnimeTypeDb::Tv,
            AnimeType::Movie => AnimeTypeDb::Movie,
            AnimeType::Ova => AnimeTypeDb::Ova,
            AnimeType::Ona => AnimeTypeDb::Ona,
            AnimeType::Special => AnimeTypeDb::Special,
        }
    }
}

impl From<AnimeTypeDb> for AnimeType {
    fn from(value: AnimeTypeDb) -> Self {
        match value {
            AnimeTypeDb::Tv => AnimeType::Tv,
            AnimeTypeDb::Movie => AnimeType::Movie,
            AnimeTypeDb::Ova => AnimeType::Ova,
            AnimeTypeDb::Ona => AnimeType::Ona,
            AnimeTypeDb::Special => AnimeType::Special,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = anime)]
pub struct AnimeModel {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub japanese_title: Option<String>,
    pub synopsis: Option<String>,
    pub rating: Option<f32>,
    pub anime_type: Option<AnimeTypeDb>,
    pub status: Option<AnimeStatusDb>,
    pub episode_count: Option<i32>,
    pub duration: Option<String>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub genres: JsonValue,
    pub mal_id: Option<i32>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnimeModel {
    pub fn to_record(self) -> AnimeRecord {
        AnimeRecord {
            id: self.id,
            slug: self.slug,
            title: self.title,
            japanese_title: self.japanese_title,
            synopsis: self.synopsis,
            rating: self.rating,
            anime_type: self.anime_type.map(Into::into),
            status: self.status.map(Into::into),
            episode_count: self.episode_count,
            duration: self.duration,
            release_date: self.release_date,
            studio: self.studio,
            genres: serde_json::from_value(self.genres).unwrap_or_default(),
            mal_id: self.mal_id,
            otakudesu_url: self.otakudesu_url,
            anoboy_url: self.anoboy_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = anime)]
pub struct NewAnime {
    pub slug: String,
    pub title: String,
    pub japanese_title: Option<String>,
    pub synopsis: Option<String>,
    pub rating: Option<f32>,
    pub anime_type: Option<AnimeTypeDb>,
    pub status: Option<AnimeStatusDb>,
    pub episode_count: Option<i32>,
    pub duration: Option<String>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub genres: JsonValue,
    pub mal_id: Option<i32>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
}

impl NewAnime {
    pub fn from_partial(partial: &AnimePartial) -> Self {
        Self {
            slug: partial.slug.clone(),
            title: partial.title.clone(),
            japanese_title: partial.japanese_title.clone(),
            synopsis: partial.synopsis.clone(),
            rating: partial.rating,
            anime_type: partial.anime_type.map(Into::into),
            status: partial.status.map(Into::into),
            episode_count: partial.episode_count,
            duration: partial.duration.clone(),
            release_date: partial.release_date.clone(),
            studio: partial.studio.clone(),
            genres: serde_json::to_value(&partial.genres).unwrap_or(JsonValue::Array(vec![])),
            mal_id: partial.mal_id,
            otakudesu_url: partial.otakudesu_url.clone(),
            anoboy_url: partial.anoboy_url.clone(),
        }
    }
}

/// Conflict changeset for re-scrapes. `None` fields are skipped, so a source
/// that failed to parse a field does not null out data from an earlier run.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = anime)]
pub struct AnimeChanges {
    pub title: Option<String>,
    pub japanese_title: Option<String>,
    pub synopsis: Option<String>,
    pub rating: Option<f32>,
    pub anime_type: Option<AnimeTypeDb>,
    pub status: Option<AnimeStatusDb>,
    pub episode_count: Option<i32>,
    pub duration: Option<String>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub genres: Option<JsonValue>,
    pub mal_id: Option<i32>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AnimeChanges {
    pub fn from_partial(partial: &AnimePartial) -> Self {
        Self {
            title: Some(partial.title.clone()),
            japanese_title: partial.japanese_title.clone(),
            synopsis: partial.synopsis.clone(),
            rating: partial.rating,
            anime_type: partial.anime_type.map(Into::into),
            status: partial.status.map(Into::into),
            episode_count: partial.episode_count,
            duration: partial.duration.clone(),
            release_date: partial.release_date.clone(),
            studio: partial.studio.clone(),
            genres: if partial.genres.is_empty() {
                None
            } else {
                serde_json::to_value(&partial.genres).ok()
            },
            mal_id: partial.mal_id,
            otakudesu_url: partial.otakudesu_url.clone(),
            anoboy_url: partial.anoboy_url.clone(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = episodes)]
pub struct EpisodeModel {
    pub id: Uuid,
    pub anime_id: Uuid,
    pub episode_number: i32,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<String>,
    pub air_date: Option<String>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub download_links: JsonValue,
    pub streaming_links: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EpisodeModel {
    pub fn to_record(self) -> EpisodeRecord {
        EpisodeRecord {
            id: self.id,
            anime_id: self.anime_id,
            episode_number: self.episode_number,
            title: self.title,
            slug: self.slug,
            duration: self.duration,
            air_date: self.air_date,
            otakudesu_url: self.otakudesu_url,
            anoboy_url: self.anoboy_url,
            download_links: serde_json::from_value::<DownloadLinks>(self.download_links)
                .unwrap_or_default(),
            streaming_links: serde_json::from_value::<StreamingLinks>(self.streaming_links)
                .unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = episodes)]
pub struct NewEpisode {
    pub anime_id: Uuid,
    pub episode_number: i32,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<String>,
    pub air_date: Option<String>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub download_links: JsonValue,
    pub streaming_links: JsonValue,
}

impl NewEpisode {
    pub fn from_partial(anime_id: Uuid, partial: &EpisodePartial) -> Self {
        Self {
            anime_id,
            episode_number: partial.episode_number,
            title: partial.title.clone(),
            slug: Some(partial.slug.clone()),
            duration: partial.duration.clone(),
            air_date: partial.air_date.clone(),
            otakudesu_url: partial.otakudesu_url.clone(),
            anoboy_url: partial.anoboy_url.clone(),
            download_links: serde_json::to_value(&partial.download_links)
                .unwrap_or(JsonValue::Object(Default::default())),
            streaming_links: serde_json::to_value(&partial.streaming_links)
                .unwrap_or(JsonValue::Object(Default::default())),
        }
    }
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = episodes)]
pub struct EpisodeChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<String>,
    pub air_date: Option<String>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub download_links: Option<JsonValue>,
    pub streaming_links: Option<JsonValue>,
    pub updated_at: DateTime<Utc>,
}

impl EpisodeChanges {
    pub fn from_partial(partial: &EpisodePartial) -> Self {
        Self {
            title: partial.title.clone(),
            slug: Some(partial.slug.clone()),
            duration: partial.duration.clone(),
            air_date: partial.air_date.clone(),
            otakudesu_url: partial.otakudesu_url.clone(),
            anoboy_url: partial.anoboy_url.clone(),
            download_links: if partial.download_links.is_empty() {
                None
            } else {
                serde_json::to_value(&partial.download_links).ok()
            },
            streaming_links: if partial.streaming_links.is_empty() {
                None
            } else {
                serde_json::to_value(&partial.streaming_links).ok()
            },
            updated_at: Utc::now(),
        }
    }
}
