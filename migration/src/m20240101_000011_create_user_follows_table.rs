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
                    .table(UserFollows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserFollows::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserFollows::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserFollows::FollowableType).string_len(20).not_null())
                    .col(ColumnDef::new(UserFollows::FollowableId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserFollows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_follows_user_id")
                            .from(UserFollows::Table, UserFollows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_follows_unique")
                    .table(UserFollows::Table)
                    .col(UserFollows::UserId)
                    .col(UserFollows::FollowableType)
                    .col(UserFollows::FollowableId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_follows_target")
                    .table(UserFollows::Table)
                    .col(UserFollows::FollowableType)
                    .col(UserFollows::FollowableId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFollows::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserFollows {
    Table,
    Id,
    UserId,
    FollowableType,
    FollowableId,
    CreatedAt,
}
