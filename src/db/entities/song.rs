use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::Genres;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "songs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub album_id: Option<Uuid>,
    pub title: String,
    pub duration_seconds: i32,
    pub song_number: Option<i32>,
    pub disc_number: i32,
    #[sea_orm(column_type = "Json")]
    pub genres: Genres,
    pub audio_url: Option<String>,
    pub preview_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub lyrics: Option<String>,
    pub explicit: bool,
    pub play_count: i64,
    pub like_count: i64,
    #[sea_orm(unique)]
    pub isrc: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::album::Entity",
        from = "Column::AlbumId",
        to = "super::album::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Album,
    #[sea_orm(has_many = "super::song_artist::Entity")]
    SongArtists,
    #[sea_orm(has_many = "super::playlist_song::Entity")]
    PlaylistSongs,
    #[sea_orm(has_many = "super::listening_history::Entity")]
    ListeningHistory,
}

impl Related<super::album::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Album.def()
    }
}

impl Related<super::song_artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SongArtists.def()
    }
}

impl Related<super::playlist_song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlaylistSongs.def()
    }
}

impl Related<super::listening_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListeningHistory.def()
    }
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        super::song_artist::Relation::Artist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::song_artist::Relation::Song.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
