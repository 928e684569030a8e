use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::Genres;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
    pub verified: bool,
    #[sea_orm(column_type = "Json")]
    pub genres: Genres,
    pub monthly_listeners: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::album_artist::Entity")]
    AlbumArtists,
    #[sea_orm(has_many = "super::song_artist::Entity")]
    SongArtists,
}

impl Related<super::album_artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumArtists.def()
    }
}

impl Related<super::song_artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SongArtists.def()
    }
}

impl Related<super::album::Entity> for Entity {
    fn to() -> RelationDef {
        super::album_artist::Relation::Album.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::album_artist::Relation::Artist.def().rev())
    }
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        super::song_artist::Relation::Song.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::song_artist::Relation::Artist.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
