use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_artists_table::Artists;
use super::m20240101_000006_create_songs_table::Songs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SongArtists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SongArtists::SongId).uuid().not_null())
                    .col(ColumnDef::new(SongArtists::ArtistId).uuid().not_null())
                    .col(
                        ColumnDef::new(SongArtists::Role)
                            .string_len(20)
                            .not_null()
                            .default("primary"),
                    )
                    .primary_key(
                        Index::create()
                            .col(SongArtists::SongId)
                            .col(SongArtists::ArtistId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_song_artists_song_id")
                            .from(SongArtists::Table, SongArtists::SongId)
                            .to(Songs::Table, Songs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_song_artists_artist_id")
                            .from(SongArtists::Table, SongArtists::ArtistId)
                            .to(Artists::Table, Artists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_song_artists_artist_id")
                    .table(SongArtists::Table)
                    .col(SongArtists::ArtistId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SongArtists::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SongArtists {
    Table,
    SongId,
    ArtistId,
    Role,
}
