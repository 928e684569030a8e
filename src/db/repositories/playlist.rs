use std::collections::HashSet;

use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use super::base::{
    contains_ci, days_ago, sum_i64, BaseRepository, DbResultExt, FindOptions, PageRequest,
    Paginated,
};
use crate::db::entities::{playlist, playlist_song, song};
use crate::error::{AppError, Result};

const ENTITY: &str = "Playlist";
const ENTRY: &str = "PlaylistSong";

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlaylist {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub is_collaborative: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub is_public: Option<bool>,
    pub is_collaborative: Option<bool>,
}

/// Target slot for one song in a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PositionUpdate {
    pub song_id: Uuid,
    pub position: i32,
}

#[derive(Debug, FromQueryResult)]
struct PlaylistTotals {
    total_songs: i64,
    duration_seconds: Option<i64>,
}

/// The owner may always modify a playlist; anyone may modify a collaborative one.
pub fn can_modify(playlist: &playlist::Model, user_id: Uuid) -> bool {
    playlist.user_id == user_id || playlist.is_collaborative
}

/// Checks that `updates` assigns each of `current` exactly one slot in 1..=N.
pub fn validate_reorder(current: &[Uuid], updates: &[PositionUpdate]) -> Result<()> {
    if updates.len() != current.len() {
        return Err(AppError::validation(
            "positions",
            format!(
                "expected a position for each of the {} songs, got {}",
                current.len(),
                updates.len()
            ),
        ));
    }

    let known: HashSet<Uuid> = current.iter().copied().collect();
    let mut seen = HashSet::with_capacity(updates.len());
    for update in updates {
        if !known.contains(&update.song_id) || !seen.insert(update.song_id) {
            return Err(AppError::validation(
                "song_id",
                format!("{} is not a distinct song of this playlist", update.song_id),
            ));
        }
    }

    let mut positions: Vec<i32> = updates.iter().map(|u| u.position).collect();
    positions.sort_unstable();
    let contiguous = positions
        .iter()
        .enumerate()
        .all(|(i, p)| *p == i as i32 + 1);
    if !contiguous {
        return Err(AppError::validation(
            "positions",
            "positions must run from 1 to the number of songs without gaps",
        ));
    }

    Ok(())
}

#[derive(Clone)]
pub struct PlaylistRepository {
    base: BaseRepository<playlist::Entity>,
}

impl PlaylistRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub fn base(&self) -> &BaseRepository<playlist::Entity> {
        &self.base
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }

    async fn begin(&self) -> Result<DatabaseTransaction> {
        self.db().begin().await.for_entity(ENTITY)
    }

    pub async fn create(&self, input: NewPlaylist) -> Result<playlist::Model> {
        let now = Utc::now().into();
        let playlist = playlist::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            name: Set(input.name),
            description: Set(input.description),
            cover_url: Set(input.cover_url),
            is_public: Set(input.is_public),
            is_collaborative: Set(input.is_collaborative),
            total_songs: Set(0),
            duration_seconds: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        self.base.create(playlist).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<playlist::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<playlist::Model> {
        self.base.get(id).await
    }

    /// Load the playlist and make sure `user_id` may change it.
    pub async fn get_for_update(&self, id: Uuid, user_id: Uuid) -> Result<playlist::Model> {
        let playlist = self.get(id).await?;
        if !can_modify(&playlist, user_id) {
            return Err(AppError::Authorization(format!(
                "user {} cannot modify playlist {}",
                user_id, id
            )));
        }
        Ok(playlist)
    }

    pub async fn update(&self, id: Uuid, changes: PlaylistChanges) -> Result<playlist::Model> {
        let mut active: playlist::ActiveModel = self.get(id).await?.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(cover_url) = changes.cover_url {
            active.cover_url = Set(Some(cover_url));
        }
        if let Some(is_public) = changes.is_public {
            active.is_public = Set(is_public);
        }
        if let Some(is_collaborative) = changes.is_collaborative {
            active.is_collaborative = Set(is_collaborative);
        }
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<playlist::Model> {
        self.base.delete(id).await
    }

    /// Entries ordered by position.
    pub async fn entries(&self, playlist_id: Uuid) -> Result<Vec<playlist_song::Model>> {
        playlist_song::Entity::find()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_song::Column::Position)
            .all(self.db())
            .await
            .for_entity(ENTRY)
    }

    pub async fn songs(&self, playlist_id: Uuid) -> Result<Vec<(playlist_song::Model, song::Model)>> {
        let rows = playlist_song::Entity::find()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_song::Column::Position)
            .find_also_related(song::Entity)
            .all(self.db())
            .await
            .for_entity(ENTRY)?;

        Ok(rows
            .into_iter()
            .filter_map(|(entry, song)| song.map(|s| (entry, s)))
            .collect())
    }

    pub async fn contains_song(&self, playlist_id: Uuid, song_id: Uuid) -> Result<bool> {
        let count = playlist_song::Entity::find()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_song::Column::SongId.eq(song_id))
            .count(self.db())
            .await
            .for_entity(ENTRY)?;
        Ok(count > 0)
    }

    /// Append a song at position N+1. A song can appear in a playlist only once.
    pub async fn add_song(
        &self,
        playlist_id: Uuid,
        song_id: Uuid,
        added_by: Option<Uuid>,
    ) -> Result<playlist_song::Model> {
        self.get(playlist_id).await?;
        if song::Entity::find_by_id(song_id)
            .one(self.db())
            .await
            .for_entity("Song")?
            .is_none()
        {
            return Err(AppError::not_found("Song", song_id));
        }
        if self.contains_song(playlist_id, song_id).await? {
            return Err(AppError::validation("song_id", "song is already in this playlist"));
        }

        let txn = self.begin().await?;
        let count = playlist_song::Entity::find()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .count(&txn)
            .await
            .for_entity(ENTRY)?;

        let entry = playlist_song::ActiveModel {
            id: Set(Uuid::new_v4()),
            playlist_id: Set(playlist_id),
            song_id: Set(song_id),
            position: Set(count as i32 + 1),
            added_by: Set(added_by),
            added_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .for_entity(ENTRY)?;
        txn.commit().await.for_entity(ENTRY)?;

        self.sync_stats(playlist_id).await?;
        Ok(entry)
    }

    /// Remove a song and close the gap it leaves behind.
    pub async fn remove_song(&self, playlist_id: Uuid, song_id: Uuid) -> Result<playlist_song::Model> {
        let txn = self.begin().await?;

        let entry = playlist_song::Entity::find()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_song::Column::SongId.eq(song_id))
            .one(&txn)
            .await
            .for_entity(ENTRY)?
            .ok_or_else(|| AppError::not_found(ENTRY, song_id))?;

        playlist_song::Entity::delete_by_id(entry.id)
            .exec(&txn)
            .await
            .for_entity(ENTRY)?;

        playlist_song::Entity::update_many()
            .col_expr(
                playlist_song::Column::Position,
                Expr::col(playlist_song::Column::Position).sub(1),
            )
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_song::Column::Position.gt(entry.position))
            .exec(&txn)
            .await
            .for_entity(ENTRY)?;

        txn.commit().await.for_entity(ENTRY)?;

        self.sync_stats(playlist_id).await?;
        Ok(entry)
    }

    /// Ids of every playlist that holds `song_id`.
    pub async fn playlists_containing(&self, song_id: Uuid) -> Result<Vec<Uuid>> {
        playlist_song::Entity::find()
            .select_only()
            .column(playlist_song::Column::PlaylistId)
            .filter(playlist_song::Column::SongId.eq(song_id))
            .into_tuple()
            .all(self.db())
            .await
            .for_entity(ENTRY)
    }

    /// Take a song out of every playlist, renumbering each one. Returns the playlists touched.
    pub async fn detach_song(&self, song_id: Uuid) -> Result<Vec<Uuid>> {
        let playlist_ids = self.playlists_containing(song_id).await?;
        for playlist_id in &playlist_ids {
            self.remove_song(*playlist_id, song_id).await?;
        }
        if !playlist_ids.is_empty() {
            tracing::debug!("Detached song {} from {} playlists", song_id, playlist_ids.len());
        }
        Ok(playlist_ids)
    }

    /// Apply a complete new ordering atomically.
    pub async fn reorder(
        &self,
        playlist_id: Uuid,
        updates: Vec<PositionUpdate>,
    ) -> Result<Vec<playlist_song::Model>> {
        self.get(playlist_id).await?;
        let current: Vec<Uuid> = self
            .entries(playlist_id)
            .await?
            .into_iter()
            .map(|e| e.song_id)
            .collect();
        validate_reorder(&current, &updates)?;

        let txn = self.begin().await?;
        Self::write_positions(&txn, playlist_id, &updates).await?;
        txn.commit().await.for_entity(ENTRY)?;

        self.entries(playlist_id).await
    }

    pub async fn shuffle(&self, playlist_id: Uuid) -> Result<Vec<playlist_song::Model>> {
        self.get(playlist_id).await?;
        let mut song_ids: Vec<Uuid> = self
            .entries(playlist_id)
            .await?
            .into_iter()
            .map(|e| e.song_id)
            .collect();
        song_ids.shuffle(&mut rand::thread_rng());

        let updates: Vec<PositionUpdate> = song_ids
            .into_iter()
            .enumerate()
            .map(|(i, song_id)| PositionUpdate {
                song_id,
                position: i as i32 + 1,
            })
            .collect();

        let txn = self.begin().await?;
        Self::write_positions(&txn, playlist_id, &updates).await?;
        txn.commit().await.for_entity(ENTRY)?;

        self.entries(playlist_id).await
    }

    async fn write_positions(
        txn: &DatabaseTransaction,
        playlist_id: Uuid,
        updates: &[PositionUpdate],
    ) -> Result<()> {
        for update in updates {
            playlist_song::Entity::update_many()
                .col_expr(playlist_song::Column::Position, Expr::value(update.position))
                .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
                .filter(playlist_song::Column::SongId.eq(update.song_id))
                .exec(txn)
                .await
                .for_entity(ENTRY)?;
        }
        Ok(())
    }

    /// Copy a playlist for `new_owner`. The copy starts private and non-collaborative.
    pub async fn duplicate(
        &self,
        playlist_id: Uuid,
        new_owner: Uuid,
        name: Option<String>,
    ) -> Result<playlist::Model> {
        let source = self.get(playlist_id).await?;
        let entries = self.entries(playlist_id).await?;
        let now = Utc::now().into();

        let txn = self.begin().await?;
        let copy = playlist::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new_owner),
            name: Set(name.unwrap_or_else(|| format!("{} (Copy)", source.name))),
            description: Set(source.description.clone()),
            cover_url: Set(source.cover_url.clone()),
            is_public: Set(false),
            is_collaborative: Set(false),
            total_songs: Set(source.total_songs),
            duration_seconds: Set(source.duration_seconds),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .for_entity(ENTITY)?;

        if !entries.is_empty() {
            let rows = entries.iter().enumerate().map(|(i, entry)| playlist_song::ActiveModel {
                id: Set(Uuid::new_v4()),
                playlist_id: Set(copy.id),
                song_id: Set(entry.song_id),
                position: Set(i as i32 + 1),
                added_by: Set(Some(new_owner)),
                added_at: Set(now),
            });
            playlist_song::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .for_entity(ENTRY)?;
        }
        txn.commit().await.for_entity(ENTITY)?;

        tracing::info!(
            "Duplicated playlist {} into {} with {} songs",
            playlist_id,
            copy.id,
            entries.len()
        );
        Ok(copy)
    }

    /// Drop every entry and zero the stats.
    pub async fn clear(&self, playlist_id: Uuid) -> Result<u64> {
        let playlist = self.get(playlist_id).await?;

        let txn = self.begin().await?;
        let removed = playlist_song::Entity::delete_many()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .exec(&txn)
            .await
            .for_entity(ENTRY)?
            .rows_affected;

        let mut active: playlist::ActiveModel = playlist.into();
        active.total_songs = Set(0);
        active.duration_seconds = Set(0);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.for_entity(ENTITY)?;
        txn.commit().await.for_entity(ENTITY)?;

        Ok(removed)
    }

    pub async fn update_stats(&self, id: Uuid, total_songs: i32, duration_seconds: i32) -> Result<playlist::Model> {
        if total_songs < 0 {
            return Err(AppError::validation("total_songs", "cannot be negative"));
        }
        if duration_seconds < 0 {
            return Err(AppError::validation("duration_seconds", "cannot be negative"));
        }

        let mut active: playlist::ActiveModel = self.get(id).await?.into();
        active.total_songs = Set(total_songs);
        active.duration_seconds = Set(duration_seconds);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    /// Recompute song count and total duration from the entries.
    pub async fn sync_stats(&self, id: Uuid) -> Result<playlist::Model> {
        let totals = playlist_song::Entity::find()
            .select_only()
            .column_as(
                Expr::col(playlist_song::Column::Id.as_column_ref()).count(),
                "total_songs",
            )
            .column_as(sum_i64(song::Column::DurationSeconds), "duration_seconds")
            .inner_join(song::Entity)
            .filter(playlist_song::Column::PlaylistId.eq(id))
            .into_model::<PlaylistTotals>()
            .one(self.db())
            .await
            .for_entity(ENTITY)?;

        let (total_songs, duration_seconds) = totals
            .map(|t| (t.total_songs, t.duration_seconds.unwrap_or(0)))
            .unwrap_or((0, 0));
        self.update_stats(id, total_songs as i32, duration_seconds as i32).await
    }

    pub async fn find_public(&self, request: PageRequest) -> Result<Paginated<playlist::Model>> {
        self.base
            .find_many_paginated(
                FindOptions::new()
                    .filter(playlist::Column::IsPublic.eq(true))
                    .order_desc(playlist::Column::UpdatedAt),
                request,
            )
            .await
    }

    pub async fn find_popular(&self, limit: u64) -> Result<Vec<playlist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(playlist::Column::IsPublic.eq(true))
                    .order_desc(playlist::Column::TotalSongs)
                    .order_desc(playlist::Column::UpdatedAt)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_recent(&self, days: i64, limit: u64) -> Result<Vec<playlist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::all()
                            .add(playlist::Column::IsPublic.eq(true))
                            .add(playlist::Column::CreatedAt.gte(days_ago(days))),
                    )
                    .order_desc(playlist::Column::CreatedAt)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<playlist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(playlist::Column::UserId.eq(user_id))
                    .order_desc(playlist::Column::UpdatedAt),
            )
            .await
    }

    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<playlist::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::all()
                            .add(playlist::Column::IsPublic.eq(true))
                            .add(contains_ci(playlist::Column::Name, query)),
                    )
                    .order_asc(playlist::Column::Name)
                    .limit(limit),
            )
            .await
    }

    /// Empty playlists created more than `days` days ago.
    pub async fn delete_empty_older_than(&self, days: i64) -> Result<u64> {
        self.base
            .delete_many(
                Condition::all()
                    .add(playlist::Column::TotalSongs.eq(0))
                    .add(playlist::Column::CreatedAt.lt(days_ago(days))),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_validate_reorder_accepts_permutation() {
        let current = ids(3);
        let updates = vec![
            PositionUpdate { song_id: current[2], position: 1 },
            PositionUpdate { song_id: current[0], position: 2 },
            PositionUpdate { song_id: current[1], position: 3 },
        ];
        assert!(validate_reorder(&current, &updates).is_ok());
    }

    #[test]
    fn test_validate_reorder_rejects_gap() {
        let current = ids(3);
        let updates = vec![
            PositionUpdate { song_id: current[0], position: 1 },
            PositionUpdate { song_id: current[1], position: 2 },
            PositionUpdate { song_id: current[2], position: 4 },
        ];
        let err = validate_reorder(&current, &updates).unwrap_err();
        assert_eq!(err.field(), Some("positions"));
    }

    #[test]
    fn test_validate_reorder_rejects_missing_rows() {
        let current = ids(3);
        let updates = vec![PositionUpdate { song_id: current[0], position: 1 }];
        let err = validate_reorder(&current, &updates).unwrap_err();
        assert_eq!(err.field(), Some("positions"));
    }

    #[test]
    fn test_validate_reorder_rejects_repeated_song() {
        let current = ids(2);
        let updates = vec![
            PositionUpdate { song_id: current[0], position: 1 },
            PositionUpdate { song_id: current[0], position: 2 },
        ];
        let err = validate_reorder(&current, &updates).unwrap_err();
        assert_eq!(err.field(), Some("song_id"));
    }
}
