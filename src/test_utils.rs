//! Test utilities for TuneStream
//!
//! Provides helpers for creating isolated test environments with:
//! - In-memory SQLite databases (one per test)
//! - AppState factories with an empty listening session
//! - Test data generators

use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use crate::{
    config::Config,
    db::{
        entities::{album, artist, playlist, song, user},
        enums::{AlbumType, ArtistRole, SubscriptionTier},
        repositories::{
            AlbumRepository, ArtistRepository, NewAlbum, NewArtist, NewPlaylist, NewSong, NewUser,
            PlaylistRepository, SongRepository, UserRepository,
        },
    },
    player::LibrarySession,
    state::AppState,
};

/// Setup an in-memory SQLite database with all migrations applied
///
/// Each call creates a fresh, isolated database, so tests can run in parallel.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create a test configuration with sensible defaults
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        music_folder_path: None,
        maintenance_schedule: "0 0 3 * * *".to_string(),
        history_retention_days: 365,
        inactive_user_days: 730,
    }
}

/// Create a complete test AppState with an isolated database
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    AppState::new(db, test_config(), LibrarySession::new())
}

// ============================================================================
// Test Data Factories
// ============================================================================

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Create a user with a unique username and email
pub async fn create_test_user(db: &DatabaseConnection) -> user::Model {
    let suffix = unique_suffix();
    UserRepository::new(db.clone())
        .create(NewUser {
            username: format!("listener_{}", suffix),
            email: format!("listener_{}@example.com", suffix),
            display_name: Some(format!("Listener {}", suffix)),
            avatar_url: None,
            subscription_tier: SubscriptionTier::Free,
            country: Some("US".to_string()),
            preferred_language: Some("en".to_string()),
        })
        .await
        .expect("Failed to insert test user")
}

pub async fn create_test_artist(db: &DatabaseConnection, name: &str) -> artist::Model {
    ArtistRepository::new(db.clone())
        .create(NewArtist {
            name: name.to_string(),
            genres: vec!["Electronic".to_string()],
            ..Default::default()
        })
        .await
        .expect("Failed to insert test artist")
}

/// Create an album credited to `artist_id` as primary artist
pub async fn create_test_album(db: &DatabaseConnection, artist_id: Uuid, title: &str) -> album::Model {
    let albums = AlbumRepository::new(db.clone());
    let album = albums
        .create(NewAlbum {
            title: title.to_string(),
            description: None,
            cover_url: None,
            release_date: None,
            album_type: AlbumType::Album,
            genres: vec!["Electronic".to_string()],
            label: None,
        })
        .await
        .expect("Failed to insert test album");
    albums
        .add_artist(album.id, artist_id, ArtistRole::Primary)
        .await
        .expect("Failed to link test album artist");
    album
}

/// Create a song with a unique title
pub async fn create_test_song(
    db: &DatabaseConnection,
    album_id: Option<Uuid>,
    duration_seconds: i32,
) -> song::Model {
    SongRepository::new(db.clone())
        .create(NewSong {
            title: format!("Track {}", unique_suffix()),
            album_id,
            duration_seconds,
            genres: vec!["Electronic".to_string()],
            ..Default::default()
        })
        .await
        .expect("Failed to insert test song")
}

/// Create a song and credit it to `artist_id`
pub async fn create_test_song_by(
    db: &DatabaseConnection,
    artist_id: Uuid,
    album_id: Option<Uuid>,
    duration_seconds: i32,
) -> song::Model {
    let song = create_test_song(db, album_id, duration_seconds).await;
    SongRepository::new(db.clone())
        .link_artist(song.id, artist_id, ArtistRole::Primary)
        .await
        .expect("Failed to link test song artist");
    song
}

pub async fn create_test_playlist(db: &DatabaseConnection, owner: Uuid, name: &str) -> playlist::Model {
    PlaylistRepository::new(db.clone())
        .create(NewPlaylist {
            user_id: owner,
            name: name.to_string(),
            description: None,
            cover_url: None,
            is_public: true,
            is_collaborative: false,
        })
        .await
        .expect("Failed to insert test playlist")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        let songs = song::Entity::find().all(&db).await.unwrap();
        assert_eq!(songs.len(), 0);
    }

    #[tokio::test]
    async fn test_create_test_user_is_unique() {
        let db = setup_test_db().await;
        let first = create_test_user(&db).await;
        let second = create_test_user(&db).await;

        assert_ne!(first.username, second.username);
        assert_ne!(first.email, second.email);
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_create_test_album_links_artist() {
        let db = setup_test_db().await;
        let artist = create_test_artist(&db, "Luna Eclipse").await;
        let album = create_test_album(&db, artist.id, "Nocturnal Vibes").await;

        let artists = AlbumRepository::new(db.clone()).artists(album.id).await.unwrap();
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].0.id, artist.id);
        assert_eq!(artists[0].1, ArtistRole::Primary);
    }

    #[tokio::test]
    async fn test_parallel_databases() {
        let (db1, db2) = tokio::join!(setup_test_db(), setup_test_db());

        create_test_artist(&db1, "Artist 1").await;
        create_test_artist(&db2, "Artist 2").await;

        let db1_artists = artist::Entity::find().all(&db1).await.unwrap();
        let db2_artists = artist::Entity::find().all(&db2).await.unwrap();

        assert_eq!(db1_artists.len(), 1);
        assert_eq!(db2_artists.len(), 1);
        assert_eq!(db1_artists[0].name, "Artist 1");
        assert_eq!(db2_artists[0].name, "Artist 2");
    }
}
