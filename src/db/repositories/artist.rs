use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::base::{
    clean_genres, contains_ci, require_genres, BaseRepository, FindOptions, PageRequest, Paginated,
};
use super::{AlbumRepository, SongRepository};
use crate::db::entities::{album, artist, song};
use crate::error::{AppError, Result};

const ENTITY: &str = "Artist";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
}

#[derive(Clone)]
pub struct ArtistRepository {
    base: BaseRepository<artist::Entity>,
}

impl ArtistRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub fn base(&self) -> &BaseRepository<artist::Entity> {
        &self.base
    }

    pub async fn create(&self, input: NewArtist) -> Result<artist::Model> {
        let now = Utc::now().into();
        let artist = artist::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            bio: Set(input.bio),
            image_url: Set(input.image_url),
            banner_url: Set(input.banner_url),
            verified: Set(input.verified),
            genres: Set(clean_genres(input.genres)),
            monthly_listeners: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        self.base.create(artist).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<artist::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<artist::Model> {
        self.base.get(id).await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Paginated<artist::Model>> {
        self.base
            .find_many_paginated(FindOptions::new().order_asc(artist::Column::Name), request)
            .await
    }

    pub async fn update(&self, id: Uuid, changes: ArtistChanges) -> Result<artist::Model> {
        let mut active: artist::ActiveModel = self.get(id).await?.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(url) = changes.image_url {
            active.image_url = Set(Some(url));
        }
        if let Some(url) = changes.banner_url {
            active.banner_url = Set(Some(url));
        }
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<artist::Model> {
        self.base.delete(id).await
    }

    /// Exact, case-insensitive name lookup.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<artist::Model>> {
        let candidates = self
            .base
            .find_many(FindOptions::new().filter(contains_ci(artist::Column::Name, name)))
            .await?;
        Ok(candidates
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(name.trim())))
    }

    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<artist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(contains_ci(artist::Column::Name, query))
                    .order_desc(artist::Column::MonthlyListeners)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_verified(&self) -> Result<Vec<artist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(artist::Column::Verified.eq(true))
                    .order_asc(artist::Column::Name),
            )
            .await
    }

    pub async fn find_popular(&self, limit: u64) -> Result<Vec<artist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .order_desc(artist::Column::MonthlyListeners)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_genre(&self, genre: &str) -> Result<Vec<artist::Model>> {
        let artists = self
            .base
            .find_many(FindOptions::new().order_desc(artist::Column::MonthlyListeners))
            .await?;
        Ok(artists.into_iter().filter(|a| a.genres.contains(genre)).collect())
    }

    pub async fn update_monthly_listeners(&self, id: Uuid, listeners: i64) -> Result<artist::Model> {
        if listeners < 0 {
            return Err(AppError::validation("monthly_listeners", "cannot be negative"));
        }
        let mut active: artist::ActiveModel = self.get(id).await?.into();
        active.monthly_listeners = Set(listeners);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn set_verified(&self, id: Uuid, verified: bool) -> Result<artist::Model> {
        let mut active: artist::ActiveModel = self.get(id).await?.into();
        active.verified = Set(verified);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn update_genres(&self, id: Uuid, genres: Vec<String>) -> Result<artist::Model> {
        let genres = require_genres(genres)?;
        let mut active: artist::ActiveModel = self.get(id).await?.into();
        active.genres = Set(genres);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn top_songs(&self, artist_id: Uuid, limit: usize) -> Result<Vec<song::Model>> {
        self.get(artist_id).await?;
        let mut songs = SongRepository::new(self.base.db().clone())
            .find_by_artist(artist_id)
            .await?;
        songs.truncate(limit);
        Ok(songs)
    }

    pub async fn albums(&self, artist_id: Uuid) -> Result<Vec<album::Model>> {
        self.get(artist_id).await?;
        AlbumRepository::new(self.base.db().clone())
            .find_by_artist(artist_id)
            .await
    }
}
