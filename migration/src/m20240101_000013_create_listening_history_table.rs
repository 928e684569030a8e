use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240101_000006_create_songs_table::Songs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ListeningHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListeningHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ListeningHistory::UserId).uuid().not_null())
                    .col(ColumnDef::new(ListeningHistory::SongId).uuid().not_null())
                    .col(
                        ColumnDef::new(ListeningHistory::PlayedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListeningHistory::PlayDurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ListeningHistory::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ListeningHistory::DeviceType).string_len(50))
                    .col(ColumnDef::new(ListeningHistory::Source).string_len(50))
                    .col(ColumnDef::new(ListeningHistory::SourceId).uuid())
                    .col(
                        ColumnDef::new(ListeningHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listening_history_user_id")
                            .from(ListeningHistory::Table, ListeningHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listening_history_song_id")
                            .from(ListeningHistory::Table, ListeningHistory::SongId)
                            .to(Songs::Table, Songs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listening_history_user_played_at")
                    .table(ListeningHistory::Table)
                    .col(ListeningHistory::UserId)
                    .col(ListeningHistory::PlayedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listening_history_song_id")
                    .table(ListeningHistory::Table)
                    .col(ListeningHistory::SongId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListeningHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ListeningHistory {
    Table,
    Id,
    UserId,
    SongId,
    PlayedAt,
    PlayDurationSeconds,
    Completed,
    DeviceType,
    Source,
    SourceId,
    CreatedAt,
}
