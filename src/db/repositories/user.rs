use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::base::{contains_ci, days_ago, BaseRepository, FindOptions, PageRequest, Paginated};
use super::UserLikeRepository;
use crate::db::entities::user;
use crate::db::enums::SubscriptionTier;
use crate::error::{AppError, Result};

const ENTITY: &str = "User";

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default = "default_tier")]
    pub subscription_tier: SubscriptionTier,
    pub country: Option<String>,
    pub preferred_language: Option<String>,
}

fn default_tier() -> SubscriptionTier {
    SubscriptionTier::Free
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub country: Option<String>,
    pub preferred_language: Option<String>,
}

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository<user::Entity>,
    likes: UserLikeRepository,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            likes: UserLikeRepository::new(db.clone()),
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub fn base(&self) -> &BaseRepository<user::Entity> {
        &self.base
    }

    pub async fn create(&self, input: NewUser) -> Result<user::Model> {
        let now = Utc::now().into();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            display_name: Set(input.display_name),
            avatar_url: Set(input.avatar_url),
            subscription_tier: Set(input.subscription_tier),
            country: Set(input.country),
            preferred_language: Set(input.preferred_language),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        self.base.create(user).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>> {
        self.base.find_by_id(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<user::Model> {
        self.base.get(id).await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Paginated<user::Model>> {
        self.base
            .find_many_paginated(FindOptions::new().order_asc(user::Column::Username), request)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<user::Model> {
        self.get(id).await?;
        self.likes.release_song_likes(&[id]).await?;
        self.base.delete(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        self.base
            .find_first(
                FindOptions::new().filter(user::Column::Email.eq(email.trim().to_lowercase())),
            )
            .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        self.base
            .find_first(FindOptions::new().filter(user::Column::Username.eq(username.trim())))
            .await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.base
            .exists(Condition::all().add(user::Column::Email.eq(email.trim().to_lowercase())))
            .await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.base
            .exists(Condition::all().add(user::Column::Username.eq(username.trim())))
            .await
    }

    pub async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<user::Model> {
        let mut active: user::ActiveModel = self.get(id).await?.into();
        if let Some(name) = changes.display_name {
            active.display_name = Set(Some(name));
        }
        if let Some(url) = changes.avatar_url {
            active.avatar_url = Set(Some(url));
        }
        if let Some(country) = changes.country {
            active.country = Set(Some(country));
        }
        if let Some(language) = changes.preferred_language {
            active.preferred_language = Set(Some(language));
        }
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn update_subscription_tier(&self, id: Uuid, tier: &str) -> Result<user::Model> {
        let tier: SubscriptionTier = tier.parse()?;
        let mut active: user::ActiveModel = self.get(id).await?.into();
        active.subscription_tier = Set(tier);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn record_login(&self, id: Uuid) -> Result<user::Model> {
        let mut active: user::ActiveModel = self.get(id).await?.into();
        let now = Utc::now().into();
        active.last_login_at = Set(Some(now));
        active.updated_at = Set(now);
        self.base.update(active).await
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<user::Model> {
        self.set_active(id, false).await
    }

    pub async fn reactivate(&self, id: Uuid) -> Result<user::Model> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<user::Model> {
        let user = self.get(id).await?;
        if user.is_active == is_active {
            return Ok(user);
        }
        let mut active: user::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        self.base.update(active).await
    }

    pub async fn find_active(&self, request: PageRequest) -> Result<Paginated<user::Model>> {
        self.base
            .find_many_paginated(
                FindOptions::new()
                    .filter(user::Column::IsActive.eq(true))
                    .order_asc(user::Column::Username),
                request,
            )
            .await
    }

    pub async fn find_by_subscription_tier(&self, tier: SubscriptionTier) -> Result<Vec<user::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(user::Column::SubscriptionTier.eq(tier))
                    .order_asc(user::Column::Username),
            )
            .await
    }

    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<user::Model>> {
        if query.trim().is_empty() {
            return Err(AppError::validation("query", "search query cannot be empty"));
        }
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::any()
                            .add(contains_ci(user::Column::Username, query))
                            .add(contains_ci(user::Column::DisplayName, query)),
                    )
                    .order_asc(user::Column::Username)
                    .limit(limit),
            )
            .await
    }

    /// Remove deactivated accounts untouched for more than `days` days.
    pub async fn delete_inactive_users(&self, days: i64) -> Result<u64> {
        let ids: Vec<Uuid> = self
            .base
            .find_many(
                FindOptions::new().filter(
                    Condition::all()
                        .add(user::Column::IsActive.eq(false))
                        .add(user::Column::UpdatedAt.lt(days_ago(days))),
                ),
            )
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let released = self.likes.release_song_likes(&ids).await?;
        tracing::debug!("Released {} song likes from {} inactive users", released, ids.len());

        self.base
            .delete_many(Condition::all().add(user::Column::Id.is_in(ids)))
            .await
    }
}
