use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::EqualizerBands;
use crate::db::enums::AudioQuality;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub theme: String,
    pub audio_quality: AudioQuality,
    pub autoplay: bool,
    pub crossfade_seconds: i32,
    pub explicit_content: bool,
    #[sea_orm(column_type = "Json")]
    pub equalizer: EqualizerBands,
    pub volume: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
