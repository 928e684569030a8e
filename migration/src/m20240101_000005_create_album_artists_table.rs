use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_artists_table::Artists;
use super::m20240101_000004_create_albums_table::Albums;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlbumArtists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AlbumArtists::AlbumId).uuid().not_null())
                    .col(ColumnDef::new(AlbumArtists::ArtistId).uuid().not_null())
                    .col(
                        ColumnDef::new(AlbumArtists::Role)
                            .string_len(20)
                            .not_null()
                            .default("primary"),
                    )
                    .primary_key(
                        Index::create()
                            .col(AlbumArtists::AlbumId)
                            .col(AlbumArtists::ArtistId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_artists_album_id")
                            .from(AlbumArtists::Table, AlbumArtists::AlbumId)
                            .to(Albums::Table, Albums::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_artists_artist_id")
                            .from(AlbumArtists::Table, AlbumArtists::ArtistId)
                            .to(Artists::Table, Artists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_album_artists_artist_id")
                    .table(AlbumArtists::Table)
                    .col(AlbumArtists::ArtistId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlbumArtists::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AlbumArtists {
    Table,
    AlbumId,
    ArtistId,
    Role,
}
