use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition,
    DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::base::{
    clean_genres, contains_ci, days_ago, require_genres, sum_i64, BaseRepository, DbResultExt, FindOptions,
    PageRequest, Paginated,
};
use crate::db::entities::{listening_history, song, song_artist};
use crate::db::enums::ArtistRole;
use crate::error::{AppError, Result};

const ENTITY: &str = "Song";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub album_id: Option<Uuid>,
    pub duration_seconds: i32,
    pub song_number: Option<i32>,
    pub disc_number: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub audio_url: Option<String>,
    pub preview_url: Option<String>,
    pub lyrics: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongChanges {
    pub title: Option<String>,
    pub duration_seconds: Option<i32>,
    pub audio_url: Option<String>,
    pub preview_url: Option<String>,
    pub lyrics: Option<String>,
    pub explicit: Option<bool>,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongStats {
    pub total_songs: i64,
    pub total_duration: i64,
    pub total_plays: i64,
    pub explicit_songs: i64,
    pub average_duration: f64,
}

#[derive(Debug, FromQueryResult)]
struct SongTotals {
    total_songs: i64,
    total_duration: Option<i64>,
    total_plays: Option<i64>,
}

#[derive(Clone)]
pub struct SongRepository {
    base: BaseRepository<song::Entity>,
}

impl SongRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub fn base(&self) -> &BaseRepository<song::Entity> {
        &self.base
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }

    pub async fn create(&self, input: NewSong) -> Result<song::Model> {
        let now = Utc::now().into();
        let song = song::ActiveModel {
            id: Set(Uuid::new_v4()),
            album_id: Set(input.album_id),
            title: Set(input.title),
            duration_seconds: Set(input.duration_seconds),
            song_number: Set(input.song_number),
            disc_number: Set(input.disc_number.unwrap_or(1)),
            genres: Set(clean_genres(input.genres)),
            audio_url: Set(input.audio_url),
            preview_url: Set(input.preview_url),
            lyrics: Set(input.lyrics),
            explicit: Set(input.explicit),
            play_count: Set(0),
            like_count: Set(0),
            isrc: Set(input.isrc),
            created_at: Set(now),
            updated_at: Set(now),
        };

        self.base.create(song).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<song::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<song::Model> {
        self.base.get(id).await
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<song::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(FindOptions::new().filter(song::Column::Id.is_in(ids.iter().copied())))
            .await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Paginated<song::Model>> {
        self.base
            .find_many_paginated(FindOptions::new().order_asc(song::Column::Title), request)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<song::Model> {
        self.base.delete(id).await
    }

    pub async fn find_by_title(&self, title: &str) -> Result<Vec<song::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(contains_ci(song::Column::Title, title))
                    .order_asc(song::Column::Title),
            )
            .await
    }

    /// Songs on an album in track order.
    pub async fn find_by_album(&self, album_id: Uuid) -> Result<Vec<song::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(song::Column::AlbumId.eq(album_id))
                    .order_asc(song::Column::DiscNumber)
                    .order_asc(song::Column::SongNumber),
            )
            .await
    }

    pub async fn find_by_artist(&self, artist_id: Uuid) -> Result<Vec<song::Model>> {
        song::Entity::find()
            .inner_join(song_artist::Entity)
            .filter(song_artist::Column::ArtistId.eq(artist_id))
            .order_by_desc(song::Column::PlayCount)
            .all(self.db())
            .await
            .for_entity(ENTITY)
    }

    /// Genre membership is checked after loading so the JSON column stays portable.
    pub async fn find_by_genre(&self, genre: &str, limit: u64) -> Result<Vec<song::Model>> {
        let songs = self
            .base
            .find_many(FindOptions::new().order_desc(song::Column::PlayCount))
            .await?;

        Ok(songs
            .into_iter()
            .filter(|s| s.genres.contains(genre))
            .take(limit as usize)
            .collect())
    }

    pub async fn find_popular(&self, limit: u64) -> Result<Vec<song::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .order_desc(song::Column::PlayCount)
                    .order_asc(song::Column::Title)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_recent(&self, days: i64, limit: u64) -> Result<Vec<song::Model>> {
        let since = days_ago(days);
        self.base
            .find_many(
                FindOptions::new()
                    .filter(song::Column::CreatedAt.gte(since))
                    .order_desc(song::Column::CreatedAt)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_explicit(&self, explicit: bool, limit: u64) -> Result<Vec<song::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(song::Column::Explicit.eq(explicit))
                    .order_desc(song::Column::PlayCount)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_duration(&self, min_seconds: i32, max_seconds: i32) -> Result<Vec<song::Model>> {
        if min_seconds > max_seconds {
            return Err(AppError::validation("duration", "minimum exceeds maximum"));
        }
        self.base
            .find_many(
                FindOptions::new()
                    .filter(song::Column::DurationSeconds.between(min_seconds, max_seconds))
                    .order_asc(song::Column::DurationSeconds),
            )
            .await
    }

    /// Songs sharing a genre with `song_id` whose length is within 20% of it.
    pub async fn find_similar(&self, song_id: Uuid, limit: u64) -> Result<Vec<song::Model>> {
        let seed = self.get(song_id).await?;
        let min = (seed.duration_seconds as f64 * 0.8).floor() as i32;
        let max = (seed.duration_seconds as f64 * 1.2).ceil() as i32;

        let candidates = self
            .base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::all()
                            .add(song::Column::Id.ne(song_id))
                            .add(song::Column::DurationSeconds.between(min, max)),
                    )
                    .order_desc(song::Column::PlayCount),
            )
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|s| s.genres.shares_any(&seed.genres))
            .take(limit as usize)
            .collect())
    }

    /// Most completed plays within the last `days` days.
    pub async fn find_trending(&self, days: i64, limit: u64) -> Result<Vec<song::Model>> {
        let since = days_ago(days);
        let ranked: Vec<(Uuid, i64)> = listening_history::Entity::find()
            .select_only()
            .column(listening_history::Column::SongId)
            .column_as(Expr::col(listening_history::Column::Id).count(), "plays")
            .filter(listening_history::Column::PlayedAt.gte(since))
            .filter(listening_history::Column::Completed.eq(true))
            .group_by(listening_history::Column::SongId)
            .order_by_desc(Expr::col(listening_history::Column::Id).count())
            .limit(limit)
            .into_tuple()
            .all(self.db())
            .await
            .for_entity(ENTITY)?;

        let ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        let mut songs = self.find_by_ids(&ids).await?;
        songs.sort_by_key(|s| ids.iter().position(|id| *id == s.id));
        Ok(songs)
    }

    pub async fn find_random(&self, limit: usize) -> Result<Vec<song::Model>> {
        let ids: Vec<Uuid> = song::Entity::find()
            .select_only()
            .column(song::Column::Id)
            .into_tuple()
            .all(self.db())
            .await
            .for_entity(ENTITY)?;

        let picked: Vec<Uuid> = ids
            .choose_multiple(&mut rand::thread_rng(), limit)
            .copied()
            .collect();

        let mut songs = self.find_by_ids(&picked).await?;
        songs.shuffle(&mut rand::thread_rng());
        Ok(songs)
    }

    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<song::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(contains_ci(song::Column::Title, query))
                    .order_desc(song::Column::PlayCount)
                    .limit(limit),
            )
            .await
    }

    pub async fn update_details(&self, id: Uuid, changes: SongChanges) -> Result<song::Model> {
        if let Some(duration) = changes.duration_seconds {
            if duration <= 0 {
                return Err(AppError::validation("duration_seconds", "must be greater than 0"));
            }
        }

        let mut active: song::ActiveModel = self.get(id).await?.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(duration) = changes.duration_seconds {
            active.duration_seconds = Set(duration);
        }
        if let Some(url) = changes.audio_url {
            active.audio_url = Set(Some(url));
        }
        if let Some(url) = changes.preview_url {
            active.preview_url = Set(Some(url));
        }
        if let Some(lyrics) = changes.lyrics {
            active.lyrics = Set(Some(lyrics));
        }
        if let Some(explicit) = changes.explicit {
            active.explicit = Set(explicit);
        }
        if let Some(isrc) = changes.isrc {
            active.isrc = Set(Some(isrc));
        }
        active.updated_at = Set(Utc::now().into());

        self.base.update(active).await
    }

    /// Adds `increment` plays in a single UPDATE.
    pub async fn update_play_count(&self, id: Uuid, increment: i64) -> Result<song::Model> {
        if increment < 0 {
            return Err(AppError::validation("increment", "play count cannot decrease"));
        }

        let result = song::Entity::update_many()
            .col_expr(
                song::Column::PlayCount,
                Expr::col(song::Column::PlayCount).add(increment),
            )
            .filter(song::Column::Id.eq(id))
            .exec(self.db())
            .await
            .for_entity(ENTITY)?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found(ENTITY, id));
        }

        self.get(id).await
    }

    pub async fn increment_play_count(&self, id: Uuid) -> Result<song::Model> {
        self.update_play_count(id, 1).await
    }

    /// Shift the denormalized like counter in the database; it never drops below zero.
    pub async fn update_like_count(&self, id: Uuid, delta: i64) -> Result<song::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let shift = song::Entity::update_many()
            .col_expr(
                song::Column::LikeCount,
                Expr::col(song::Column::LikeCount).add(delta),
            )
            .col_expr(song::Column::UpdatedAt, Expr::value(now))
            .filter(song::Column::Id.eq(id));
        let shift = if delta < 0 {
            shift.filter(song::Column::LikeCount.gte(-delta))
        } else {
            shift
        };
        let result = shift.exec(self.db()).await.for_entity(ENTITY)?;

        // A decrement larger than the counter floors it at zero
        if result.rows_affected == 0 && delta < 0 {
            song::Entity::update_many()
                .col_expr(song::Column::LikeCount, Expr::value(0))
                .filter(song::Column::Id.eq(id))
                .filter(song::Column::LikeCount.lt(-delta))
                .exec(self.db())
                .await
                .for_entity(ENTITY)?;
        }

        self.get(id).await
    }

    pub async fn update_position(
        &self,
        id: Uuid,
        song_number: i32,
        disc_number: i32,
    ) -> Result<song::Model> {
        if song_number <= 0 {
            return Err(AppError::validation("song_number", "must be greater than 0"));
        }
        if disc_number <= 0 {
            return Err(AppError::validation("disc_number", "must be greater than 0"));
        }

        let mut active: song::ActiveModel = self.get(id).await?.into();
        active.song_number = Set(Some(song_number));
        active.disc_number = Set(disc_number);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn update_genres(&self, id: Uuid, genres: Vec<String>) -> Result<song::Model> {
        let genres = require_genres(genres)?;
        let mut active: song::ActiveModel = self.get(id).await?.into();
        active.genres = Set(genres);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn add_genre(&self, id: Uuid, genre: &str) -> Result<song::Model> {
        let song = self.get(id).await?;
        if song.genres.contains(genre) {
            return Ok(song);
        }
        let mut genres = song.genres.0.clone();
        genres.push(genre.to_string());
        self.update_genres(id, genres).await
    }

    pub async fn remove_genre(&self, id: Uuid, genre: &str) -> Result<song::Model> {
        let song = self.get(id).await?;
        if !song.genres.contains(genre) {
            return Ok(song);
        }
        let remaining: Vec<String> = song
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

    pub async fn link_artist(&self, song_id: Uuid, artist_id: Uuid, role: ArtistRole) -> Result<()> {
        let link = song_artist::ActiveModel {
            song_id: Set(song_id),
            artist_id: Set(artist_id),
            role: Set(role),
        };
        link.insert(self.db()).await.for_entity("SongArtist")?;
        Ok(())
    }

    pub async fn artist_links(&self, song_ids: &[Uuid]) -> Result<Vec<song_artist::Model>> {
        if song_ids.is_empty() {
            return Ok(Vec::new());
        }
        song_artist::Entity::find()
            .filter(song_artist::Column::SongId.is_in(song_ids.iter().copied()))
            .all(self.db())
            .await
            .for_entity("SongArtist")
    }

    pub async fn stats(&self) -> Result<SongStats> {
        let (totals, explicit_songs) = tokio::try_join!(
            async {
                song::Entity::find()
                    .select_only()
                    .column_as(Expr::col(song::Column::Id).count(), "total_songs")
                    .column_as(sum_i64(song::Column::DurationSeconds), "total_duration")
                    .column_as(sum_i64(song::Column::PlayCount), "total_plays")
                    .into_model::<SongTotals>()
                    .one(self.db())
                    .await
                    .for_entity(ENTITY)
            },
            self.base.count(Condition::all().add(song::Column::Explicit.eq(true))),
        )?;

        let (total_songs, total_duration, total_plays) = totals
            .map(|t| (t.total_songs, t.total_duration.unwrap_or(0), t.total_plays.unwrap_or(0)))
            .unwrap_or((0, 0, 0));
        let average_duration = if total_songs > 0 {
            total_duration as f64 / total_songs as f64
        } else {
            0.0
        };

        Ok(SongStats {
            total_songs,
            total_duration,
            total_plays,
            explicit_songs: explicit_songs as i64,
            average_duration,
        })
    }
}
