use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use super::base::{BaseRepository, DbResultExt, FindOptions};
use super::SongRepository;
use crate::db::entities::{song, user_like};
use crate::db::enums::{LikeTarget, LikeableType};
use crate::error::{AppError, Result};

const ENTITY: &str = "UserLike";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LikeStats {
    pub songs: u64,
    pub albums: u64,
    pub playlists: u64,
    pub artists: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularItem {
    pub id: Uuid,
    pub likes: i64,
}

#[derive(Clone)]
pub struct UserLikeRepository {
    base: BaseRepository<user_like::Entity>,
    songs: SongRepository,
}

impl UserLikeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            songs: SongRepository::new(db.clone()),
            base: BaseRepository::new(db, ENTITY),
        }
    }

    fn target_filter(user_id: Uuid, target: LikeTarget) -> Condition {
        Condition::all()
            .add(user_like::Column::UserId.eq(user_id))
            .add(user_like::Column::LikeableType.eq(target.kind()))
            .add(user_like::Column::LikeableId.eq(target.id()))
    }

    pub async fn is_liked(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        self.base.exists(Self::target_filter(user_id, target)).await
    }

    pub async fn like(&self, user_id: Uuid, target: LikeTarget) -> Result<user_like::Model> {
        if self.is_liked(user_id, target).await? {
            return Err(AppError::validation("likeable_id", "already liked"));
        }

        let like = self
            .base
            .create(user_like::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                likeable_type: Set(target.kind()),
                likeable_id: Set(target.id()),
                created_at: Set(Utc::now().into()),
            })
            .await?;

        if let LikeTarget::Song(song_id) = target {
            self.songs.update_like_count(song_id, 1).await?;
        }

        Ok(like)
    }

    pub async fn unlike(&self, user_id: Uuid, target: LikeTarget) -> Result<()> {
        let removed = self.base.delete_many(Self::target_filter(user_id, target)).await?;
        if removed == 0 {
            return Err(AppError::not_found(ENTITY, target.id()));
        }

        if let LikeTarget::Song(song_id) = target {
            self.songs.update_like_count(song_id, -1).await?;
        }

        Ok(())
    }

    /// Flip the like and return whether the target is now liked.
    pub async fn toggle_like(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        if self.is_liked(user_id, target).await? {
            self.unlike(user_id, target).await?;
            Ok(false)
        } else {
            self.like(user_id, target).await?;
            Ok(true)
        }
    }

    pub async fn liked_items(
        &self,
        user_id: Uuid,
        kind: Option<LikeableType>,
    ) -> Result<Vec<LikeTarget>> {
        let mut options = FindOptions::new()
            .filter(user_like::Column::UserId.eq(user_id))
            .order_desc(user_like::Column::CreatedAt);
        if let Some(kind) = kind {
            options = options.filter(user_like::Column::LikeableType.eq(kind));
        }

        let likes = self.base.find_many(options).await?;
        Ok(likes
            .into_iter()
            .map(|like| LikeTarget::new(like.likeable_type, like.likeable_id))
            .collect())
    }

    /// Liked songs, most recently liked first.
    pub async fn liked_songs(&self, user_id: Uuid) -> Result<Vec<song::Model>> {
        let ids: Vec<Uuid> = self
            .liked_items(user_id, Some(LikeableType::Song))
            .await?
            .into_iter()
            .map(|t| t.id())
            .collect();

        let mut songs = self.songs.find_by_ids(&ids).await?;
        songs.sort_by_key(|s| ids.iter().position(|id| *id == s.id));
        Ok(songs)
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<LikeStats> {
        let kinds: Vec<LikeableType> = user_like::Entity::find()
            .select_only()
            .column(user_like::Column::LikeableType)
            .filter(user_like::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.base.db())
            .await
            .for_entity(ENTITY)?;

        let mut stats = LikeStats::default();
        for kind in kinds {
            match kind {
                LikeableType::Song => stats.songs += 1,
                LikeableType::Album => stats.albums += 1,
                LikeableType::Playlist => stats.playlists += 1,
                LikeableType::Artist => stats.artists += 1,
            }
            stats.total += 1;
        }
        Ok(stats)
    }

    /// Take the song likes of `user_ids` back out of the song counters. Run before
    /// deleting those users, since their like rows go with them.
    pub async fn release_song_likes(&self, user_ids: &[Uuid]) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let per_song: Vec<(Uuid, i64)> = user_like::Entity::find()
            .select_only()
            .column(user_like::Column::LikeableId)
            .column_as(Expr::col(user_like::Column::Id).count(), "likes")
            .filter(user_like::Column::LikeableType.eq(LikeableType::Song))
            .filter(user_like::Column::UserId.is_in(user_ids.iter().copied()))
            .group_by(user_like::Column::LikeableId)
            .into_tuple()
            .all(self.base.db())
            .await
            .for_entity(ENTITY)?;

        let mut released = 0;
        for (song_id, likes) in per_song {
            match self.songs.update_like_count(song_id, -likes).await {
                Ok(_) => released += likes as u64,
                Err(AppError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(released)
    }

    /// Most liked targets of one kind across all users.
    pub async fn popular_items(&self, kind: LikeableType, limit: u64) -> Result<Vec<PopularItem>> {
        let rows: Vec<(Uuid, i64)> = user_like::Entity::find()
            .select_only()
            .column(user_like::Column::LikeableId)
            .column_as(Expr::col(user_like::Column::Id).count(), "likes")
            .filter(user_like::Column::LikeableType.eq(kind))
            .group_by(user_like::Column::LikeableId)
            .order_by_desc(Expr::col(user_like::Column::Id).count())
            .limit(limit)
            .into_tuple()
            .all(self.base.db())
            .await
            .for_entity(ENTITY)?;

        Ok(rows
            .into_iter()
            .map(|(id, likes)| PopularItem { id, likes })
            .collect())
    }
}
