//! Integration tests for the repository layer
//!
//! Every test runs against its own in-memory SQLite database with all
//! migrations applied.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};

use tunestream::db::enums::{AlbumType, FollowTarget, LibraryItem, LikeTarget};
use tunestream::db::repositories::{
    AlbumRepository, ListeningHistoryRepository, NewPlay, NewSong, PageRequest, PlaylistRepository,
    PositionUpdate, SongRepository, UserFollowRepository, UserLibraryRepository,
    UserLikeRepository, UserRepository,
};
use tunestream::error::AppError;
use tunestream::services::CatalogService;
use tunestream::test_utils::*;

fn assert_contiguous(positions: &[i32]) {
    let expected: Vec<i32> = (1..=positions.len() as i32).collect();
    assert_eq!(positions, expected.as_slice());
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_song_pagination_last_page() {
    let db = setup_test_db().await;
    for _ in 0..25 {
        create_test_song(&db, None, 200).await;
    }

    let page = SongRepository::new(db.clone())
        .list(PageRequest::new(3, 10))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 5);
    assert_eq!(page.total, 25);
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_next);
    assert!(page.has_prev);
}

#[tokio::test]
async fn test_song_pagination_first_page() {
    let db = setup_test_db().await;
    for _ in 0..25 {
        create_test_song(&db, None, 200).await;
    }

    let page = SongRepository::new(db.clone())
        .list(PageRequest::new(1, 10))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 10);
    assert!(page.has_next);
    assert!(!page.has_prev);
}

#[tokio::test]
async fn test_album_stats_follow_songs() {
    let db = setup_test_db().await;
    let artist = create_test_artist(&db, "Luna Eclipse").await;
    let album = create_test_album(&db, artist.id, "Nocturnal Vibes").await;

    let catalog = CatalogService::new(db.clone());
    for duration in [120, 180, 200] {
        catalog
            .create_song(NewSong {
                title: format!("Track {}", duration),
                album_id: Some(album.id),
                duration_seconds: duration,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let synced = AlbumRepository::new(db.clone()).sync_stats(album.id).await.unwrap();
    assert_eq!(synced.total_songs, 3);
    assert_eq!(synced.duration_seconds, 500);
}

#[tokio::test]
async fn test_album_sync_without_songs_is_zero() {
    let db = setup_test_db().await;
    let artist = create_test_artist(&db, "Quiet Room").await;
    let album = create_test_album(&db, artist.id, "Silence").await;

    let synced = AlbumRepository::new(db.clone()).sync_stats(album.id).await.unwrap();
    assert_eq!(synced.total_songs, 0);
    assert_eq!(synced.duration_seconds, 0);
}

#[tokio::test]
async fn test_invalid_album_type_leaves_album_unchanged() {
    let db = setup_test_db().await;
    let artist = create_test_artist(&db, "Neon Skyline").await;
    let album = create_test_album(&db, artist.id, "City Lights").await;
    let albums = AlbumRepository::new(db.clone());

    let err = albums.update_album_type(album.id, "invalid").await.unwrap_err();
    match err {
        AppError::Validation { field, .. } => assert_eq!(field, "album_type"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let stored = albums.get(album.id).await.unwrap();
    assert_eq!(stored.album_type, AlbumType::Album);

    let updated = albums.update_album_type(album.id, "ep").await.unwrap();
    assert_eq!(updated.album_type, AlbumType::Ep);
}

#[tokio::test]
async fn test_create_song_requires_positive_duration() {
    let db = setup_test_db().await;
    let err = CatalogService::new(db.clone())
        .create_song(NewSong {
            title: "Broken".to_string(),
            duration_seconds: 0,
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "duration_seconds"));
}

#[tokio::test]
async fn test_missing_song_is_not_found() {
    let db = setup_test_db().await;
    let err = SongRepository::new(db.clone())
        .get(uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { .. }));
}

// ============================================================================
// Playlists
// ============================================================================

#[tokio::test]
async fn test_playlist_positions_stay_contiguous() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let playlist = create_test_playlist(&db, owner.id, "Road Trip").await;
    let playlists = PlaylistRepository::new(db.clone());

    let mut songs = Vec::new();
    for duration in [100, 110, 120, 130] {
        songs.push(create_test_song(&db, None, duration).await);
    }
    for song in &songs {
        playlists.add_song(playlist.id, song.id, Some(owner.id)).await.unwrap();
    }

    let entries = playlists.entries(playlist.id).await.unwrap();
    assert_contiguous(&entries.iter().map(|e| e.position).collect::<Vec<_>>());
    let stats = playlists.get(playlist.id).await.unwrap();
    assert_eq!(stats.total_songs, 4);
    assert_eq!(stats.duration_seconds, 460);

    // Removing from the middle closes the gap
    playlists.remove_song(playlist.id, songs[1].id).await.unwrap();
    let entries = playlists.entries(playlist.id).await.unwrap();
    assert_contiguous(&entries.iter().map(|e| e.position).collect::<Vec<_>>());
    assert_eq!(
        entries.iter().map(|e| e.song_id).collect::<Vec<_>>(),
        vec![songs[0].id, songs[2].id, songs[3].id]
    );

    let reversed: Vec<PositionUpdate> = entries
        .iter()
        .rev()
        .enumerate()
        .map(|(i, e)| PositionUpdate {
            song_id: e.song_id,
            position: i as i32 + 1,
        })
        .collect();
    let reordered = playlists.reorder(playlist.id, reversed).await.unwrap();
    assert_eq!(
        reordered.iter().map(|e| e.song_id).collect::<Vec<_>>(),
        vec![songs[3].id, songs[2].id, songs[0].id]
    );

    let shuffled = playlists.shuffle(playlist.id).await.unwrap();
    assert_eq!(shuffled.len(), 3);
    assert_contiguous(&shuffled.iter().map(|e| e.position).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_playlist_rejects_duplicate_song() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let playlist = create_test_playlist(&db, owner.id, "Favorites").await;
    let song = create_test_song(&db, None, 180).await;
    let playlists = PlaylistRepository::new(db.clone());

    assert_ok!(playlists.add_song(playlist.id, song.id, None).await);
    let err = assert_err!(playlists.add_song(playlist.id, song.id, None).await);

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(playlists.entries(playlist.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_playlist_reorder_must_cover_every_song() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let playlist = create_test_playlist(&db, owner.id, "Partial").await;
    let first = create_test_song(&db, None, 180).await;
    let second = create_test_song(&db, None, 200).await;
    let playlists = PlaylistRepository::new(db.clone());
    playlists.add_song(playlist.id, first.id, None).await.unwrap();
    playlists.add_song(playlist.id, second.id, None).await.unwrap();

    let err = playlists
        .reorder(
            playlist.id,
            vec![PositionUpdate {
                song_id: second.id,
                position: 1,
            }],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    let entries = playlists.entries(playlist.id).await.unwrap();
    assert_eq!(entries[0].song_id, first.id);
}

#[tokio::test]
async fn test_playlist_duplicate_and_clear() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let other = create_test_user(&db).await;
    let playlist = create_test_playlist(&db, owner.id, "Chill Vibes").await;
    let playlists = PlaylistRepository::new(db.clone());
    for duration in [150, 250] {
        let song = create_test_song(&db, None, duration).await;
        playlists.add_song(playlist.id, song.id, None).await.unwrap();
    }

    let copy = playlists.duplicate(playlist.id, other.id, None).await.unwrap();
    assert_eq!(copy.name, "Chill Vibes (Copy)");
    assert_eq!(copy.user_id, other.id);
    assert!(!copy.is_public);
    assert_eq!(playlists.entries(copy.id).await.unwrap().len(), 2);

    let removed = playlists.clear(playlist.id).await.unwrap();
    assert_eq!(removed, 2);
    let cleared = playlists.get(playlist.id).await.unwrap();
    assert_eq!(cleared.total_songs, 0);
    assert_eq!(cleared.duration_seconds, 0);

    // The copy keeps its own entries
    assert_eq!(playlists.entries(copy.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_deleting_song_renumbers_playlists() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let road_trip = create_test_playlist(&db, owner.id, "Road Trip").await;
    let workout = create_test_playlist(&db, owner.id, "Workout").await;
    let playlists = PlaylistRepository::new(db.clone());

    let mut songs = Vec::new();
    for duration in [100, 200, 300] {
        songs.push(create_test_song(&db, None, duration).await);
    }
    for song in &songs {
        playlists.add_song(road_trip.id, song.id, None).await.unwrap();
    }
    playlists.add_song(workout.id, songs[1].id, None).await.unwrap();
    playlists.add_song(workout.id, songs[2].id, None).await.unwrap();

    let (deleted, touched) = CatalogService::new(db.clone())
        .delete_song(songs[1].id)
        .await
        .unwrap();
    assert_eq!(deleted.id, songs[1].id);
    assert_eq!(touched.len(), 2);

    let entries = playlists.entries(road_trip.id).await.unwrap();
    assert_contiguous(&entries.iter().map(|e| e.position).collect::<Vec<_>>());
    assert_eq!(
        entries.iter().map(|e| e.song_id).collect::<Vec<_>>(),
        vec![songs[0].id, songs[2].id]
    );
    let stats = playlists.get(road_trip.id).await.unwrap();
    assert_eq!(stats.total_songs, 2);
    assert_eq!(stats.duration_seconds, 400);

    let workout_entries = playlists.entries(workout.id).await.unwrap();
    assert_eq!(workout_entries.len(), 1);
    assert_eq!(workout_entries[0].position, 1);

    // The next append lands right after the survivors
    let late = create_test_song(&db, None, 150).await;
    let entry = playlists.add_song(road_trip.id, late.id, None).await.unwrap();
    assert_eq!(entry.position, 3);
    let entries = playlists.entries(road_trip.id).await.unwrap();
    assert_contiguous(&entries.iter().map(|e| e.position).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_get_for_update_checks_ownership() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let stranger = create_test_user(&db).await;
    let playlist = create_test_playlist(&db, owner.id, "Mine").await;
    let playlists = PlaylistRepository::new(db.clone());

    assert_ok!(playlists.get_for_update(playlist.id, owner.id).await);
    let err = assert_err!(playlists.get_for_update(playlist.id, stranger.id).await);
    assert!(matches!(err, AppError::Authorization(_)));
}

// ============================================================================
// Social
// ============================================================================

#[tokio::test]
async fn test_toggle_like_twice_restores_like_count() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let song = create_test_song(&db, None, 210).await;
    let likes = UserLikeRepository::new(db.clone());
    let songs = SongRepository::new(db.clone());

    assert!(likes.toggle_like(user.id, LikeTarget::Song(song.id)).await.unwrap());
    assert_eq!(songs.get(song.id).await.unwrap().like_count, 1);
    assert!(likes.is_liked(user.id, LikeTarget::Song(song.id)).await.unwrap());

    assert!(!likes.toggle_like(user.id, LikeTarget::Song(song.id)).await.unwrap());
    assert_eq!(songs.get(song.id).await.unwrap().like_count, 0);
    assert!(!likes.is_liked(user.id, LikeTarget::Song(song.id)).await.unwrap());
}

#[tokio::test]
async fn test_liking_twice_is_rejected() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let song = create_test_song(&db, None, 210).await;
    let likes = UserLikeRepository::new(db.clone());

    likes.like(user.id, LikeTarget::Song(song.id)).await.unwrap();
    assert!(likes.like(user.id, LikeTarget::Song(song.id)).await.is_err());
    assert_eq!(SongRepository::new(db.clone()).get(song.id).await.unwrap().like_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_keep_every_increment() {
    let db = setup_test_db().await;
    let song = create_test_song(&db, None, 210).await;
    let mut users = Vec::new();
    for _ in 0..20 {
        users.push(create_test_user(&db).await);
    }

    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let likes = UserLikeRepository::new(db.clone());
            let (user_id, song_id) = (user.id, song.id);
            tokio::spawn(async move { likes.like(user_id, LikeTarget::Song(song_id)).await })
        })
        .collect();
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }
    assert_eq!(SongRepository::new(db.clone()).get(song.id).await.unwrap().like_count, 20);

    let handles: Vec<_> = users
        .iter()
        .take(15)
        .map(|user| {
            let likes = UserLikeRepository::new(db.clone());
            let (user_id, song_id) = (user.id, song.id);
            tokio::spawn(async move { likes.toggle_like(user_id, LikeTarget::Song(song_id)).await })
        })
        .collect();
    for handle in handles {
        assert!(!handle.await.unwrap().unwrap());
    }
    assert_eq!(SongRepository::new(db.clone()).get(song.id).await.unwrap().like_count, 5);
}

#[tokio::test]
async fn test_like_count_never_goes_negative() {
    let db = setup_test_db().await;
    let song = create_test_song(&db, None, 210).await;
    let songs = SongRepository::new(db.clone());

    songs.update_like_count(song.id, 2).await.unwrap();
    assert_eq!(songs.update_like_count(song.id, -5).await.unwrap().like_count, 0);
    assert!(matches!(
        songs.update_like_count(uuid::Uuid::new_v4(), 1).await,
        Err(AppError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_deleting_user_releases_song_likes() {
    let db = setup_test_db().await;
    let leaving = create_test_user(&db).await;
    let staying = create_test_user(&db).await;
    let first = create_test_song(&db, None, 200).await;
    let second = create_test_song(&db, None, 220).await;
    let likes = UserLikeRepository::new(db.clone());
    let songs = SongRepository::new(db.clone());

    likes.like(leaving.id, LikeTarget::Song(first.id)).await.unwrap();
    likes.like(leaving.id, LikeTarget::Song(second.id)).await.unwrap();
    likes.like(staying.id, LikeTarget::Song(first.id)).await.unwrap();

    UserRepository::new(db.clone()).delete(leaving.id).await.unwrap();

    assert_eq!(songs.get(first.id).await.unwrap().like_count, 1);
    assert_eq!(songs.get(second.id).await.unwrap().like_count, 0);
    assert!(likes.is_liked(staying.id, LikeTarget::Song(first.id)).await.unwrap());
}

#[tokio::test]
async fn test_follow_rules() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let friend = create_test_user(&db).await;
    let artist = create_test_artist(&db, "Echo Valley").await;
    let follows = UserFollowRepository::new(db.clone());

    assert_err!(follows.follow(user.id, FollowTarget::User(user.id)).await);

    assert!(follows.toggle_follow(user.id, FollowTarget::User(friend.id)).await.unwrap());
    assert!(follows.toggle_follow(user.id, FollowTarget::Artist(artist.id)).await.unwrap());

    let stats = follows.stats(user.id).await.unwrap();
    assert_eq!(stats.following_users, 1);
    assert_eq!(stats.following_artists, 1);
    assert_eq!(follows.follower_count(FollowTarget::User(friend.id)).await.unwrap(), 1);

    assert!(!follows.toggle_follow(user.id, FollowTarget::Artist(artist.id)).await.unwrap());
    assert_eq!(follows.stats(user.id).await.unwrap().following_artists, 0);
}

#[tokio::test]
async fn test_library_save_and_stats() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let artist = create_test_artist(&db, "Midnight Drive").await;
    let album = create_test_album(&db, artist.id, "After Hours").await;
    let song = create_test_song(&db, Some(album.id), 190).await;
    let library = UserLibraryRepository::new(db.clone());

    assert!(library.toggle_save(user.id, LibraryItem::Song(song.id)).await.unwrap());
    assert!(library.toggle_save(user.id, LibraryItem::Album(album.id)).await.unwrap());
    assert!(library.save(user.id, LibraryItem::Song(song.id)).await.is_err());

    let stats = library.stats(user.id).await.unwrap();
    assert_eq!(stats.songs, 1);
    assert_eq!(stats.albums, 1);
    assert_eq!(stats.total, 2);

    let export = library.export(user.id).await.unwrap();
    assert_eq!(export.songs, vec![song.id]);
    assert_eq!(export.albums, vec![album.id]);

    assert_eq!(library.clear(user.id, None).await.unwrap(), 2);
    assert_eq!(library.stats(user.id).await.unwrap().total, 0);
}

// ============================================================================
// Listening history
// ============================================================================

fn play(user_id: uuid::Uuid, song_id: uuid::Uuid, days_ago: i64, completed: bool) -> NewPlay {
    NewPlay {
        user_id,
        song_id,
        played_at: Some((Utc::now() - Duration::days(days_ago)).into()),
        play_duration_seconds: 180,
        completed,
        device_type: Some("desktop".to_string()),
        source: Some("album".to_string()),
        source_id: None,
    }
}

#[tokio::test]
async fn test_play_streaks_count_consecutive_days() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let song = create_test_song(&db, None, 180).await;
    let history = ListeningHistoryRepository::new(db.clone());

    for days_ago in [0, 1, 2, 5, 6, 7, 8] {
        history.record_play(play(user.id, song.id, days_ago, true)).await.unwrap();
    }
    // Incomplete plays do not extend a streak
    history.record_play(play(user.id, song.id, 3, false)).await.unwrap();

    let streaks = history.play_streaks(user.id).await.unwrap();
    assert_eq!(streaks.current_streak, 3);
    assert_eq!(streaks.longest_streak, 4);
}

#[tokio::test]
async fn test_top_tracks_ranked_by_completed_plays() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let artist = create_test_artist(&db, "Solar Flare").await;
    let favorite = create_test_song_by(&db, artist.id, None, 200).await;
    let other = create_test_song_by(&db, artist.id, None, 220).await;
    let history = ListeningHistoryRepository::new(db.clone());

    for _ in 0..3 {
        history.record_play(play(user.id, favorite.id, 0, true)).await.unwrap();
    }
    history.record_play(play(user.id, other.id, 0, true)).await.unwrap();
    history.record_play(play(user.id, other.id, 0, false)).await.unwrap();

    let top = history.top_tracks(user.id, 10, None).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].song.id, favorite.id);
    assert_eq!(top[0].play_count, 3);
    assert_eq!(top[1].play_count, 1);

    let artists = history.top_artists(user.id, 10, Some(30)).await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].artist.id, artist.id);
    assert_eq!(artists[0].play_count, 4);

    let stats = history.listening_stats(user.id, None).await.unwrap();
    assert_eq!(stats.total_plays, 5);
    assert_eq!(stats.completed_plays, 4);
    assert_eq!(stats.unique_songs, 2);
}

#[tokio::test]
async fn test_negative_play_duration_is_rejected() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let song = create_test_song(&db, None, 180).await;

    let mut bad = play(user.id, song.id, 0, true);
    bad.play_duration_seconds = -5;
    let err = ListeningHistoryRepository::new(db.clone())
        .record_play(bad)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_delete_old_history() {
    let db = setup_test_db().await;
    let user = create_test_user(&db).await;
    let song = create_test_song(&db, None, 180).await;
    let history = ListeningHistoryRepository::new(db.clone());

    history.record_play(play(user.id, song.id, 400, true)).await.unwrap();
    history.record_play(play(user.id, song.id, 1, true)).await.unwrap();

    assert_eq!(history.delete_old(365).await.unwrap(), 1);
    assert_eq!(history.find_recent_for_user(user.id, 10).await.unwrap().len(), 1);
}
