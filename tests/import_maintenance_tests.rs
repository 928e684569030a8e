//! Integration tests for library import and scheduled maintenance

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use id3::{Tag, TagLike, Version};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use sea_orm::{ActiveModelTrait, Set};

use tunestream::db::entities::user;
use tunestream::db::enums::LikeTarget;
use tunestream::db::repositories::{
    AlbumRepository, ArtistRepository, ListeningHistoryRepository, NewPlay, SongRepository,
    UserLikeRepository, UserRepository,
};
use tunestream::services::LibraryImporter;
use tunestream::tasks::maintenance::run_maintenance;
use tunestream::test_utils::*;

fn write_tagged_mp3(path: &Path, title: &str, artist: &str, album: &str, track: u32, duration_ms: u32) {
    fs::write(path, vec![0u8; 1024]).unwrap();
    let mut tag = Tag::new();
    tag.set_title(title);
    tag.set_artist(artist);
    tag.set_album(album);
    tag.set_track(track);
    tag.set_genre("Electronic");
    tag.set_duration(duration_ms);
    tag.write_to_path(path, Version::Id3v24).unwrap();
}

#[tokio::test]
async fn test_import_empty_folder() {
    let db = setup_test_db().await;
    let dir = TempDir::new().unwrap();

    let report = LibraryImporter::new(db.clone())
        .import_folder(dir.path())
        .await
        .unwrap();

    assert_eq!(report.scanned, 0);
    assert_eq!(report.imported, 0);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_import_ignores_non_mp3_files() {
    let db = setup_test_db().await;
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), b"liner notes").unwrap();
    fs::write(dir.path().join("cover.jpg"), b"not really a jpeg").unwrap();

    let report = LibraryImporter::new(db.clone())
        .import_folder(dir.path())
        .await
        .unwrap();

    assert_eq!(report.scanned, 0);
    assert_eq!(SongRepository::new(db.clone()).stats().await.unwrap().total_songs, 0);
}

#[tokio::test]
async fn test_import_missing_folder_fails() {
    let db = setup_test_db().await;
    let dir = TempDir::new().unwrap();

    let result = LibraryImporter::new(db.clone())
        .import_folder(&dir.path().join("missing"))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_import_tagged_tracks_builds_catalog() {
    let db = setup_test_db().await;
    let dir = TempDir::new().unwrap();
    write_tagged_mp3(&dir.path().join("01.mp3"), "Midnight City", "Neon Skyline", "City Lights", 1, 240_000);
    write_tagged_mp3(&dir.path().join("02.mp3"), "Night Drive", "Neon Skyline", "City Lights", 2, 200_000);

    let importer = LibraryImporter::new(db.clone());
    let report = importer.import_folder(dir.path()).await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 0);

    let artist = ArtistRepository::new(db.clone())
        .find_by_name("Neon Skyline")
        .await
        .unwrap()
        .unwrap();
    let albums = AlbumRepository::new(db.clone()).find_by_artist(artist.id).await.unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].title, "City Lights");
    assert_eq!(albums[0].total_songs, 2);
    assert_eq!(albums[0].duration_seconds, 440);

    let songs = SongRepository::new(db.clone()).find_by_album(albums[0].id).await.unwrap();
    assert_eq!(songs.len(), 2);

    // A second pass finds nothing new
    let again = importer.import_folder(dir.path()).await.unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped, 2);
}

#[tokio::test]
async fn test_maintenance_removes_expired_history() {
    let state = setup_test_app_state().await;
    let user = create_test_user(&state.db).await;
    let song = create_test_song(&state.db, None, 180).await;
    let history = ListeningHistoryRepository::new(state.db.clone());

    for days_ago in [500, 400, 3] {
        history
            .record_play(NewPlay {
                user_id: user.id,
                song_id: song.id,
                played_at: Some((Utc::now() - Duration::days(days_ago)).into()),
                play_duration_seconds: 180,
                completed: true,
                device_type: None,
                source: None,
                source_id: None,
            })
            .await
            .unwrap();
    }
    create_test_playlist(&state.db, user.id, "Fresh and Empty").await;

    let report = run_maintenance(state.clone()).await.unwrap();

    assert_eq!(report.history_removed, 2);
    assert_eq!(report.playlists_removed, 0);
    assert_eq!(report.users_removed, 0);
    assert_eq!(history.find_recent_for_user(user.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_maintenance_removes_inactive_users_and_their_likes() {
    let state = setup_test_app_state().await;
    let gone = create_test_user(&state.db).await;
    let active = create_test_user(&state.db).await;
    let song = create_test_song(&state.db, None, 200).await;
    let likes = UserLikeRepository::new(state.db.clone());
    likes.like(gone.id, LikeTarget::Song(song.id)).await.unwrap();
    likes.like(active.id, LikeTarget::Song(song.id)).await.unwrap();

    let mut stale: user::ActiveModel = gone.clone().into();
    stale.is_active = Set(false);
    stale.updated_at = Set((Utc::now() - Duration::days(800)).into());
    stale.update(&state.db).await.unwrap();

    let report = run_maintenance(state.clone()).await.unwrap();

    assert_eq!(report.users_removed, 1);
    let users = UserRepository::new(state.db.clone());
    assert!(users.find_by_id(gone.id).await.unwrap().is_none());
    assert!(users.find_by_id(active.id).await.unwrap().is_some());
    assert_eq!(
        SongRepository::new(state.db.clone()).get(song.id).await.unwrap().like_count,
        1
    );
}
