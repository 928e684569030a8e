use sea_orm_migration::prelude::*;

use super::m20240101_000004_create_albums_table::Albums;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Songs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Songs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Songs::AlbumId).uuid())
                    .col(ColumnDef::new(Songs::Title).string_len(500).not_null())
                    .col(ColumnDef::new(Songs::DurationSeconds).integer().not_null())
                    .col(ColumnDef::new(Songs::SongNumber).integer())
                    .col(
                        ColumnDef::new(Songs::DiscNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Songs::Genres).json().not_null())
                    .col(ColumnDef::new(Songs::AudioUrl).text())
                    .col(ColumnDef::new(Songs::PreviewUrl).text())
                    .col(ColumnDef::new(Songs::Lyrics).text())
                    .col(
                        ColumnDef::new(Songs::Explicit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Songs::PlayCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Songs::LikeCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Songs::Isrc).string_len(12).unique_key())
                    .col(
                        ColumnDef::new(Songs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Songs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_songs_album_id")
                            .from(Songs::Table, Songs::AlbumId)
                            .to(Albums::Table, Albums::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_songs_album_id")
                    .table(Songs::Table)
                    .col(Songs::AlbumId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_songs_play_count")
                    .table(Songs::Table)
                    .col(Songs::PlayCount)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Songs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Songs {
    Table,
    Id,
    AlbumId,
    Title,
    DurationSeconds,
    SongNumber,
    DiscNumber,
    Genres,
    AudioUrl,
    PreviewUrl,
    Lyrics,
    Explicit,
    PlayCount,
    LikeCount,
    Isrc,
    CreatedAt,
    UpdatedAt,
}
