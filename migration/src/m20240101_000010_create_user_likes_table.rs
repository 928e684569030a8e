use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserLikes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserLikes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserLikes::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserLikes::LikeableType).string_len(20).not_null())
                    .col(ColumnDef::new(UserLikes::LikeableId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserLikes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_likes_user_id")
                            .from(UserLikes::Table, UserLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_likes_unique")
                    .table(UserLikes::Table)
                    .col(UserLikes::UserId)
                    .col(UserLikes::LikeableType)
                    .col(UserLikes::LikeableId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_likes_target")
                    .table(UserLikes::Table)
                    .col(UserLikes::LikeableType)
                    .col(UserLikes::LikeableId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLikes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserLikes {
    Table,
    Id,
    UserId,
    LikeableType,
    LikeableId,
    CreatedAt,
}
