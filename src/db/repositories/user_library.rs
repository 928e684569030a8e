use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde::Serialize;
use uuid::Uuid;

use super::base::{BaseRepository, DbResultExt, FindOptions, PageRequest, Paginated};
use crate::db::entities::user_library;
use crate::db::enums::{LibraryItem, LibraryItemType};
use crate::error::{AppError, Result};

const ENTITY: &str = "UserLibrary";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub songs: u64,
    pub albums: u64,
    pub playlists: u64,
    pub artists: u64,
    pub total: u64,
}

/// Saved item ids grouped by kind, newest first within each group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryExport {
    pub songs: Vec<Uuid>,
    pub albums: Vec<Uuid>,
    pub playlists: Vec<Uuid>,
    pub artists: Vec<Uuid>,
}

#[derive(Clone)]
pub struct UserLibraryRepository {
    base: BaseRepository<user_library::Entity>,
}

impl UserLibraryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    fn item_filter(user_id: Uuid, item: LibraryItem) -> Condition {
        Condition::all()
            .add(user_library::Column::UserId.eq(user_id))
            .add(user_library::Column::ItemType.eq(item.kind()))
            .add(user_library::Column::ItemId.eq(item.id()))
    }

    fn user_filter(user_id: Uuid, kind: Option<LibraryItemType>) -> Condition {
        let mut condition = Condition::all().add(user_library::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            condition = condition.add(user_library::Column::ItemType.eq(kind));
        }
        condition
    }

    pub async fn is_saved(&self, user_id: Uuid, item: LibraryItem) -> Result<bool> {
        self.base.exists(Self::item_filter(user_id, item)).await
    }

    pub async fn save(&self, user_id: Uuid, item: LibraryItem) -> Result<user_library::Model> {
        if self.is_saved(user_id, item).await? {
            return Err(AppError::validation("item_id", "already in library"));
        }

        self.base
            .create(user_library::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                item_type: Set(item.kind()),
                item_id: Set(item.id()),
                added_at: Set(Utc::now().into()),
            })
            .await
    }

    pub async fn unsave(&self, user_id: Uuid, item: LibraryItem) -> Result<()> {
        let removed = self.base.delete_many(Self::item_filter(user_id, item)).await?;
        if removed == 0 {
            return Err(AppError::not_found(ENTITY, item.id()));
        }
        Ok(())
    }

    pub async fn toggle_save(&self, user_id: Uuid, item: LibraryItem) -> Result<bool> {
        if self.is_saved(user_id, item).await? {
            self.unsave(user_id, item).await?;
            Ok(false)
        } else {
            self.save(user_id, item).await?;
            Ok(true)
        }
    }

    pub async fn items(
        &self,
        user_id: Uuid,
        kind: Option<LibraryItemType>,
        request: PageRequest,
    ) -> Result<Paginated<LibraryItem>> {
        let page = self
            .base
            .find_many_paginated(
                FindOptions::new()
                    .filter(Self::user_filter(user_id, kind))
                    .order_desc(user_library::Column::AddedAt),
                request,
            )
            .await?;
        Ok(page.map(|entry| LibraryItem::new(entry.item_type, entry.item_id)))
    }

    pub async fn recent(&self, user_id: Uuid, limit: u64) -> Result<Vec<user_library::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(Self::user_filter(user_id, None))
                    .order_desc(user_library::Column::AddedAt)
                    .limit(limit),
            )
            .await
    }

    async fn entries(&self, user_id: Uuid) -> Result<Vec<(LibraryItemType, Uuid)>> {
        user_library::Entity::find()
            .select_only()
            .column(user_library::Column::ItemType)
            .column(user_library::Column::ItemId)
            .filter(Self::user_filter(user_id, None))
            .order_by_desc(user_library::Column::AddedAt)
            .into_tuple()
            .all(self.base.db())
            .await
            .for_entity(ENTITY)
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<LibraryStats> {
        let mut stats = LibraryStats::default();
        for (kind, _) in self.entries(user_id).await? {
            match kind {
                LibraryItemType::Song => stats.songs += 1,
                LibraryItemType::Album => stats.albums += 1,
                LibraryItemType::Playlist => stats.playlists += 1,
                LibraryItemType::Artist => stats.artists += 1,
            }
            stats.total += 1;
        }
        Ok(stats)
    }

    /// Remove every saved item, or only those of `kind`.
    pub async fn clear(&self, user_id: Uuid, kind: Option<LibraryItemType>) -> Result<u64> {
        let removed = self.base.delete_many(Self::user_filter(user_id, kind)).await?;
        tracing::info!("Cleared {} library items for user {}", removed, user_id);
        Ok(removed)
    }

    pub async fn export(&self, user_id: Uuid) -> Result<LibraryExport> {
        let mut export = LibraryExport::default();
        for (kind, id) in self.entries(user_id).await? {
            match kind {
                LibraryItemType::Song => export.songs.push(id),
                LibraryItemType::Album => export.albums.push(id),
                LibraryItemType::Playlist => export.playlists.push(id),
                LibraryItemType::Artist => export.artists.push(id),
            }
        }
        Ok(export)
    }
}
