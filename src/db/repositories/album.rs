use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use super::base::{
    clean_genres, contains_ci, require_genres, sum_i64, BaseRepository, DbResultExt, FindOptions,
    PageRequest, Paginated,
};
use crate::db::entities::{album, album_artist, artist, song};
use crate::db::enums::{AlbumType, ArtistRole};
use crate::error::{AppError, Result};

const ENTITY: &str = "Album";

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    #[serde(default = "default_album_type")]
    pub album_type: AlbumType,
    #[serde(default)]
    pub genres: Vec<String>,
    pub label: Option<String>,
}

fn default_album_type() -> AlbumType {
    AlbumType::Album
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub label: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct AlbumTotals {
    total_songs: i64,
    duration_seconds: Option<i64>,
}

#[derive(Clone)]
pub struct AlbumRepository {
    base: BaseRepository<album::Entity>,
}

impl AlbumRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub fn base(&self) -> &BaseRepository<album::Entity> {
        &self.base
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }

    pub async fn create(&self, input: NewAlbum) -> Result<album::Model> {
        let now = Utc::now().into();
        let album = album::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            cover_url: Set(input.cover_url),
            release_date: Set(input.release_date),
            album_type: Set(input.album_type),
            genres: Set(clean_genres(input.genres)),
            total_songs: Set(0),
            duration_seconds: Set(0),
            label: Set(input.label),
            created_at: Set(now),
            updated_at: Set(now),
        };

        self.base.create(album).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<album::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<album::Model> {
        self.base.get(id).await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Paginated<album::Model>> {
        self.base
            .find_many_paginated(
                FindOptions::new()
                    .order_desc(album::Column::ReleaseDate)
                    .order_asc(album::Column::Title),
                request,
            )
            .await
    }

    pub async fn update(&self, id: Uuid, changes: AlbumChanges) -> Result<album::Model> {
        let mut active: album::ActiveModel = self.get(id).await?.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(cover_url) = changes.cover_url {
            active.cover_url = Set(Some(cover_url));
        }
        if let Some(release_date) = changes.release_date {
            active.release_date = Set(Some(release_date));
        }
        if let Some(label) = changes.label {
            active.label = Set(Some(label));
        }
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<album::Model> {
        self.base.delete(id).await
    }

    pub async fn find_by_title(&self, title: &str) -> Result<Vec<album::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(contains_ci(album::Column::Title, title))
                    .order_asc(album::Column::Title),
            )
            .await
    }

    pub async fn find_by_type(&self, album_type: AlbumType) -> Result<Vec<album::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(album::Column::AlbumType.eq(album_type))
                    .order_desc(album::Column::ReleaseDate),
            )
            .await
    }

    /// Albums tagged with any of `genres`.
    pub async fn find_by_genres(&self, genres: &[String]) -> Result<Vec<album::Model>> {
        let wanted = clean_genres(genres.to_vec());
        let albums = self
            .base
            .find_many(FindOptions::new().order_desc(album::Column::ReleaseDate))
            .await?;

        Ok(albums
            .into_iter()
            .filter(|a| a.genres.shares_any(&wanted))
            .collect())
    }

    pub async fn find_by_year(&self, year: i32) -> Result<Vec<album::Model>> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| AppError::validation("year", format!("{} is out of range", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| AppError::validation("year", format!("{} is out of range", year)))?;
        self.find_by_date_range(start, end).await
    }

    pub async fn find_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<album::Model>> {
        if start > end {
            return Err(AppError::validation("release_date", "start date is after end date"));
        }
        self.base
            .find_many(
                FindOptions::new()
                    .filter(album::Column::ReleaseDate.between(start, end))
                    .order_asc(album::Column::ReleaseDate),
            )
            .await
    }

    /// Albums released within the last `days` days, newest first.
    pub async fn find_recent(&self, days: i64, limit: u64) -> Result<Vec<album::Model>> {
        let today = Utc::now().date_naive();
        let since = today - chrono::Duration::days(days);
        self.base
            .find_many(
                FindOptions::new()
                    .filter(album::Column::ReleaseDate.between(since, today))
                    .order_desc(album::Column::ReleaseDate)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_label(&self, label: &str) -> Result<Vec<album::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(contains_ci(album::Column::Label, label))
                    .order_desc(album::Column::ReleaseDate),
            )
            .await
    }

    /// Title or label match.
    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<album::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::any()
                            .add(contains_ci(album::Column::Title, query))
                            .add(contains_ci(album::Column::Label, query)),
                    )
                    .order_asc(album::Column::Title)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_artist(&self, artist_id: Uuid) -> Result<Vec<album::Model>> {
        album::Entity::find()
            .inner_join(album_artist::Entity)
            .filter(album_artist::Column::ArtistId.eq(artist_id))
            .order_by_desc(album::Column::ReleaseDate)
            .all(self.db())
            .await
            .for_entity(ENTITY)
    }

    /// Other albums sharing a genre, closest release year first.
    pub async fn find_similar(&self, album_id: Uuid, limit: u64) -> Result<Vec<album::Model>> {
        let seed = self.get(album_id).await?;
        let candidates = self
            .base
            .find_many(FindOptions::new().filter(album::Column::Id.ne(album_id)))
            .await?;

        let seed_year = seed.release_date.map(|d| d.year());
        let mut similar: Vec<album::Model> = candidates
            .into_iter()
            .filter(|a| a.genres.shares_any(&seed.genres))
            .collect();
        similar.sort_by_key(|a| match (seed_year, a.release_date) {
            (Some(y), Some(d)) => (y - d.year()).abs(),
            _ => i32::MAX,
        });
        similar.truncate(limit as usize);
        Ok(similar)
    }

    /// Reject anything outside album/single/ep/compilation before touching the row.
    pub async fn update_album_type(&self, id: Uuid, album_type: &str) -> Result<album::Model> {
        let album_type: AlbumType = album_type.parse()?;

        let mut active: album::ActiveModel = self.get(id).await?.into();
        active.album_type = Set(album_type);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn update_stats(&self, id: Uuid, total_songs: i32, duration_seconds: i32) -> Result<album::Model> {
        if total_songs < 0 {
            return Err(AppError::validation("total_songs", "cannot be negative"));
        }
        if duration_seconds < 0 {
            return Err(AppError::validation("duration_seconds", "cannot be negative"));
        }

        let mut active: album::ActiveModel = self.get(id).await?.into();
        active.total_songs = Set(total_songs);
        active.duration_seconds = Set(duration_seconds);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    /// Recompute song count and total duration from the album's songs.
    pub async fn sync_stats(&self, id: Uuid) -> Result<album::Model> {
        let totals = song::Entity::find()
            .select_only()
            .column_as(Expr::col(song::Column::Id).count(), "total_songs")
            .column_as(sum_i64(song::Column::DurationSeconds), "duration_seconds")
            .filter(song::Column::AlbumId.eq(id))
            .into_model::<AlbumTotals>()
            .one(self.db())
            .await
            .for_entity(ENTITY)?;

        let (total_songs, duration_seconds) = totals
            .map(|t| (t.total_songs, t.duration_seconds.unwrap_or(0)))
            .unwrap_or((0, 0));

        tracing::debug!(
            "Syncing album {} stats: {} songs, {}s",
            id,
            total_songs,
            duration_seconds
        );
        self.update_stats(id, total_songs as i32, duration_seconds as i32).await
    }

    pub async fn update_genres(&self, id: Uuid, genres: Vec<String>) -> Result<album::Model> {
        let genres = require_genres(genres)?;
        let mut active: album::ActiveModel = self.get(id).await?.into();
        active.genres = Set(genres);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn add_genre(&self, id: Uuid, genre: &str) -> Result<album::Model> {
        let album = self.get(id).await?;
        if album.genres.contains(genre) {
            return Ok(album);
        }
        let mut genres = album.genres.0.clone();
        genres.push(genre.to_string());
        self.update_genres(id, genres).await
    }

    pub async fn remove_genre(&self, id: Uuid, genre: &str) -> Result<album::Model> {
        let album = self.get(id).await?;
        if !album.genres.contains(genre) {
            return Ok(album);
        }
        let remaining: Vec<String> = album
            .genres
            .0
            .into_iter()
            .filter(|g| !g.eq_ignore_ascii_case(genre))
            .collect();
        if remaining.is_empty() {
            return Err(AppError::validation("genres", "cannot remove the last genre"));
        }
        self.update_genres(id, remaining).await
    }

    pub async fn add_artist(&self, album_id: Uuid, artist_id: Uuid, role: ArtistRole) -> Result<()> {
        let link = album_artist::ActiveModel {
            album_id: Set(album_id),
            artist_id: Set(artist_id),
            role: Set(role),
        };
        link.insert(self.db()).await.for_entity("AlbumArtist")?;
        Ok(())
    }

    pub async fn artists(&self, album_id: Uuid) -> Result<Vec<(artist::Model, ArtistRole)>> {
        let links = album_artist::Entity::find()
            .filter(album_artist::Column::AlbumId.eq(album_id))
            .find_also_related(artist::Entity)
            .all(self.db())
            .await
            .for_entity("AlbumArtist")?;

        Ok(links
            .into_iter()
            .filter_map(|(link, artist)| artist.map(|a| (a, link.role)))
            .collect())
    }
}
