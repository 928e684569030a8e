pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_user_preferences_table;
mod m20240101_000003_create_artists_table;
mod m20240101_000004_create_albums_table;
mod m20240101_000005_create_album_artists_table;
mod m20240101_000006_create_songs_table;
mod m20240101_000007_create_song_artists_table;
mod m20240101_000008_create_playlists_table;
mod m20240101_000009_create_playlist_songs_table;
mod m20240101_000010_create_user_likes_table;
mod m20240101_000011_create_user_follows_table;
mod m20240101_000012_create_user_library_table;
mod m20240101_000013_create_listening_history_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_user_preferences_table::Migration),
            Box::new(m20240101_000003_create_artists_table::Migration),
            Box::new(m20240101_000004_create_albums_table::Migration),
            Box::new(m20240101_000005_create_album_artists_table::Migration),
            Box::new(m20240101_000006_create_songs_table::Migration),
            Box::new(m20240101_000007_create_song_artists_table::Migration),
            Box::new(m20240101_000008_create_playlists_table::Migration),
            Box::new(m20240101_000009_create_playlist_songs_table::Migration),
            Box::new(m20240101_000010_create_user_likes_table::Migration),
            Box::new(m20240101_000011_create_user_follows_table::Migration),
            Box::new(m20240101_000012_create_user_library_table::Migration),
            Box::new(m20240101_000013_create_listening_history_table::Migration),
        ]
    }
}
