use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use super::base::{BaseRepository, DbResultExt, FindOptions};
use crate::db::entities::user_follow;
use crate::db::enums::{FollowTarget, FollowableType};
use crate::error::{AppError, Result};

const ENTITY: &str = "UserFollow";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FollowStats {
    pub following_users: u64,
    pub following_artists: u64,
    pub followers: u64,
}

#[derive(Clone)]
pub struct UserFollowRepository {
    base: BaseRepository<user_follow::Entity>,
}

impl UserFollowRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    fn target_filter(target: FollowTarget) -> Condition {
        Condition::all()
            .add(user_follow::Column::FollowableType.eq(target.kind()))
            .add(user_follow::Column::FollowableId.eq(target.id()))
    }

    fn follow_filter(user_id: Uuid, target: FollowTarget) -> Condition {
        Self::target_filter(target).add(user_follow::Column::UserId.eq(user_id))
    }

    pub async fn is_following(&self, user_id: Uuid, target: FollowTarget) -> Result<bool> {
        self.base.exists(Self::follow_filter(user_id, target)).await
    }

    pub async fn follow(&self, user_id: Uuid, target: FollowTarget) -> Result<user_follow::Model> {
        if target == FollowTarget::User(user_id) {
            return Err(AppError::validation("followable_id", "users cannot follow themselves"));
        }
        if self.is_following(user_id, target).await? {
            return Err(AppError::validation("followable_id", "already following"));
        }

        self.base
            .create(user_follow::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                followable_type: Set(target.kind()),
                followable_id: Set(target.id()),
                created_at: Set(Utc::now().into()),
            })
            .await
    }

    pub async fn unfollow(&self, user_id: Uuid, target: FollowTarget) -> Result<()> {
        let removed = self.base.delete_many(Self::follow_filter(user_id, target)).await?;
        if removed == 0 {
            return Err(AppError::not_found(ENTITY, target.id()));
        }
        Ok(())
    }

    pub async fn toggle_follow(&self, user_id: Uuid, target: FollowTarget) -> Result<bool> {
        if self.is_following(user_id, target).await? {
            self.unfollow(user_id, target).await?;
            Ok(false)
        } else {
            self.follow(user_id, target).await?;
            Ok(true)
        }
    }

    pub async fn following(
        &self,
        user_id: Uuid,
        kind: Option<FollowableType>,
    ) -> Result<Vec<FollowTarget>> {
        let mut options = FindOptions::new()
            .filter(user_follow::Column::UserId.eq(user_id))
            .order_desc(user_follow::Column::CreatedAt);
        if let Some(kind) = kind {
            options = options.filter(user_follow::Column::FollowableType.eq(kind));
        }

        let follows = self.base.find_many(options).await?;
        Ok(follows
            .into_iter()
            .map(|f| FollowTarget::new(f.followable_type, f.followable_id))
            .collect())
    }

    /// Ids of the users following `target`.
    pub async fn followers(&self, target: FollowTarget) -> Result<Vec<Uuid>> {
        user_follow::Entity::find()
            .select_only()
            .column(user_follow::Column::UserId)
            .filter(Self::target_filter(target))
            .into_tuple()
            .all(self.base.db())
            .await
            .for_entity(ENTITY)
    }

    pub async fn follower_count(&self, target: FollowTarget) -> Result<u64> {
        self.base.count(Self::target_filter(target)).await
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<FollowStats> {
        let users = Condition::all()
            .add(user_follow::Column::UserId.eq(user_id))
            .add(user_follow::Column::FollowableType.eq(FollowableType::User));
        let artists = Condition::all()
            .add(user_follow::Column::UserId.eq(user_id))
            .add(user_follow::Column::FollowableType.eq(FollowableType::Artist));

        let (following_users, following_artists, followers) = tokio::try_join!(
            self.base.count(users),
            self.base.count(artists),
            self.follower_count(FollowTarget::User(user_id)),
        )?;

        Ok(FollowStats {
            following_users,
            following_artists,
            followers,
        })
    }
}
