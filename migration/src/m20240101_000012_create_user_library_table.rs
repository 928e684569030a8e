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
                    .table(UserLibrary::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserLibrary::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserLibrary::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserLibrary::ItemType).string_len(20).not_null())
                    .col(ColumnDef::new(UserLibrary::ItemId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserLibrary::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_library_user_id")
                            .from(UserLibrary::Table, UserLibrary::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_library_unique")
                    .table(UserLibrary::Table)
                    .col(UserLibrary::UserId)
                    .col(UserLibrary::ItemType)
                    .col(UserLibrary::ItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_library_target")
                    .table(UserLibrary::Table)
                    .col(UserLibrary::ItemType)
                    .col(UserLibrary::ItemId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLibrary::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserLibrary {
    Table,
    Id,
    UserId,
    ItemType,
    ItemId,
    AddedAt,
}
