use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::Genres;
use crate::db::enums::AlbumType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "albums")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub release_date: Option<Date>,
    pub album_type: AlbumType,
    #[sea_orm(column_type = "Json")]
    pub genres: Genres,
    pub total_songs: i32,
    pub duration_seconds: i32,
    pub label: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::song::Entity")]
    Songs,
    #[sea_orm(has_many = "super::album_artist::Entity")]
    AlbumArtists,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Songs.def()
    }
}

impl Related<super::album_artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumArtists.def()
    }
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        super::album_artist::Relation::Artist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::album_artist::Relation::Album.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
