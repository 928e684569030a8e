use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Albums::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Albums::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Albums::Title).string_len(500).not_null())
                    .col(ColumnDef::new(Albums::Description).text())
                    .col(ColumnDef::new(Albums::CoverUrl).text())
                    .col(ColumnDef::new(Albums::ReleaseDate).date())
                    .col(
                        ColumnDef::new(Albums::AlbumType)
                            .string_len(20)
                            .not_null()
                            .default("album"),
                    )
                    .col(ColumnDef::new(Albums::Genres).json().not_null())
                    .col(
                        ColumnDef::new(Albums::TotalSongs)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Albums::DurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Albums::Label).string_len(255))
                    .col(
                        ColumnDef::new(Albums::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Albums::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_albums_release_date")
                    .table(Albums::Table)
                    .col(Albums::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_albums_album_type")
                    .table(Albums::Table)
                    .col(Albums::AlbumType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Albums::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Albums {
    Table,
    Id,
    Title,
    Description,
    CoverUrl,
    ReleaseDate,
    AlbumType,
    Genres,
    TotalSongs,
    DurationSeconds,
    Label,
    CreatedAt,
    UpdatedAt,
}
