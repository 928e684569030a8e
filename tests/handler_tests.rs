//! Integration tests for the HTTP surface
//!
//! Requests go through the full router, middleware included:
//! - Song CRUD and validation errors
//! - Playlist authentication and ownership
//! - Likes for the current user
//! - Player session endpoints and HTMX partials

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use fake::{faker::lorem::en::Sentence, Fake};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use tunestream::create_router;
use tunestream::handlers::auth::USER_HEADER;
use tunestream::services::to_session_songs;
use tunestream::state::AppState;
use tunestream::test_utils::*;

async fn parse_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn json_request(method: Method, uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, user: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

fn app(state: &AppState) -> Router {
    create_router(state.clone())
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json(response).await;
    assert_eq!(body["status"], "ok");
}

// ============================================================================
// Songs
// ============================================================================

#[tokio::test]
async fn test_song_crud() {
    let state = setup_test_app_state().await;
    let title: String = Sentence(2..4).fake();

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/songs",
            None,
            json!({ "title": format!("  {} ", title), "duration_seconds": 245, "genres": ["Ambient"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_json(response).await;
    assert_eq!(created["title"], title.trim());
    let id = created["id"].as_str().unwrap().to_string();

    let response = app(&state)
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/songs/{}", id),
            None,
            json!({ "title": "Ocean Waves (Remix)" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_json(response).await["title"], "Ocean Waves (Remix)");

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/api/songs", None))
        .await
        .unwrap();
    let page = parse_json(response).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);

    let response = app(&state)
        .oneshot(empty_request(Method::DELETE, &format!("/api/songs/{}", id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(&state)
        .oneshot(empty_request(Method::GET, &format!("/api/songs/{}", id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_song_validation_names_field() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/songs",
            None,
            json!({ "title": "   ", "duration_seconds": 200 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["field"], "title");
}

#[tokio::test]
async fn test_play_counts_and_records_history() {
    let state = setup_test_app_state().await;
    let user = create_test_user(&state.db).await;
    let song = create_test_song(&state.db, None, 200).await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            &format!("/api/songs/{}/play", song.id),
            Some(user.id),
            json!({ "play_duration_seconds": 200, "completed": true, "device_type": "mobile" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_json(response).await["play_count"], 1);

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/api/me/history", Some(user.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = parse_json(response).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["data"][0]["device_type"], "mobile");
}

#[tokio::test]
async fn test_album_type_rejects_unknown_value() {
    let state = setup_test_app_state().await;
    let artist = create_test_artist(&state.db, "Neon Skyline").await;
    let album = create_test_album(&state.db, artist.id, "City Lights").await;

    let response = app(&state)
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/albums/{}/type", album.id),
            None,
            json!({ "album_type": "invalid" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(response).await["field"], "album_type");
}

// ============================================================================
// Playlists
// ============================================================================

#[tokio::test]
async fn test_create_playlist_requires_user() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/playlists",
            None,
            json!({ "name": "Road Trip" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_playlist_ownership() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db).await;
    let stranger = create_test_user(&state.db).await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/playlists",
            Some(owner.id),
            json!({ "name": "Road Trip" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let playlist = parse_json(response).await;
    let id = playlist["id"].as_str().unwrap().to_string();
    assert_eq!(playlist["is_public"], true);

    let response = app(&state)
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/playlists/{}", id),
            Some(stranger.id),
            json!({ "name": "Hijacked" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&state)
        .oneshot(empty_request(
            Method::DELETE,
            &format!("/api/playlists/{}", id),
            Some(stranger.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&state)
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/playlists/{}", id),
            Some(owner.id),
            json!({ "is_public": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Private now, so only the owner can read it
    let response = app(&state)
        .oneshot(empty_request(Method::GET, &format!("/api/playlists/{}", id), Some(stranger.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&state)
        .oneshot(empty_request(Method::GET, &format!("/api/playlists/{}", id), Some(owner.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_playlist_songs_and_session_mirror() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db).await;
    let playlist = create_test_playlist(&state.db, owner.id, "Chill Vibes").await;
    let song = create_test_song(&state.db, None, 240).await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            &format!("/api/playlists/{}/songs", playlist.id),
            Some(owner.id),
            json!({ "song_id": song.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(parse_json(response).await["position"], 1);

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            &format!("/api/playlists/{}/songs", playlist.id),
            Some(owner.id),
            json!({ "song_id": song.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let session = state.session.read().await;
    let collection = session.collection(&playlist.id.to_string()).unwrap();
    assert_eq!(collection.songs.len(), 1);
    assert_eq!(collection.songs[0].id, song.id);
}

#[tokio::test]
async fn test_deleting_song_leaves_playlists_and_session() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db).await;
    let playlist = create_test_playlist(&state.db, owner.id, "Late Night").await;

    let mut ids = Vec::new();
    for duration in [180, 200, 220] {
        let song = create_test_song(&state.db, None, duration).await;
        let response = app(&state)
            .oneshot(json_request(
                Method::POST,
                &format!("/api/playlists/{}/songs", playlist.id),
                Some(owner.id),
                json!({ "song_id": song.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(song.id);
    }

    let response = app(&state)
        .oneshot(empty_request(Method::DELETE, &format!("/api/songs/{}", ids[1]), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(&state)
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/playlists/{}", playlist.id),
            Some(owner.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json(response).await;
    assert_eq!(body["playlist"]["total_songs"], 2);
    assert_eq!(body["playlist"]["duration_seconds"], 400);
    let positions: Vec<i64> = body["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, vec![1, 2]);

    let session = state.session.read().await;
    assert!(session.song(ids[1]).is_none());
    let collection = session.collection(&playlist.id.to_string()).unwrap();
    assert_eq!(
        collection.songs.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![ids[0], ids[2]]
    );
}

// ============================================================================
// Current user
// ============================================================================

#[tokio::test]
async fn test_toggle_like_for_current_user() {
    let state = setup_test_app_state().await;
    let user = create_test_user(&state.db).await;
    let song = create_test_song(&state.db, None, 180).await;
    let target = json!({ "type": "song", "id": song.id });

    let response = app(&state)
        .oneshot(json_request(Method::POST, "/api/me/likes", Some(user.id), target.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_json(response).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["target"], target);

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/api/me/likes/stats", Some(user.id)))
        .await
        .unwrap();
    assert_eq!(parse_json(response).await["songs"], 1);

    let response = app(&state)
        .oneshot(json_request(Method::POST, "/api/me/likes", Some(user.id), target))
        .await
        .unwrap();
    assert_eq!(parse_json(response).await["active"], false);
}

#[tokio::test]
async fn test_me_routes_reject_bad_user_header() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri("/api/me/library")
                .header(USER_HEADER, "not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Player session
// ============================================================================

async fn load_song(state: &AppState, duration: i32) -> Uuid {
    let song = create_test_song(&state.db, None, duration).await;
    let id = song.id;
    let songs = to_session_songs(&state.db, vec![song]).await.unwrap();
    state.session.write().await.load_songs(songs);
    id
}

#[tokio::test]
async fn test_player_play_and_controls() {
    let state = setup_test_app_state().await;
    let song_id = load_song(&state, 245).await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/player/play",
            None,
            json!({ "song_id": song_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let player = parse_json(response).await;
    assert_eq!(player["is_playing"], true);
    assert_eq!(player["duration"], 245);
    assert_eq!(player["current_song"]["id"], song_id.to_string());

    let response = app(&state)
        .oneshot(json_request(Method::POST, "/api/player/volume", None, json!({ "volume": 150 })))
        .await
        .unwrap();
    assert_eq!(parse_json(response).await["volume"], 100);

    let response = app(&state)
        .oneshot(json_request(Method::POST, "/api/player/seek", None, json!({ "position": 500 })))
        .await
        .unwrap();
    assert_eq!(parse_json(response).await["current_time"], 245);

    let response = app(&state)
        .oneshot(empty_request(Method::POST, "/api/player/toggle", None))
        .await
        .unwrap();
    assert_eq!(parse_json(response).await["is_playing"], false);
}

#[tokio::test]
async fn test_player_unknown_song_is_not_found() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/player/play",
            None,
            json!({ "song_id": Uuid::new_v4() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_player_collections() {
    let state = setup_test_app_state().await;
    let song_id = load_song(&state, 200).await;

    let response = app(&state)
        .oneshot(json_request(
            Method::POST,
            "/api/player/collections",
            None,
            json!({ "name": "Focus" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let collection = parse_json(response).await;
    let id = collection["id"].as_str().unwrap().to_string();

    let add = || {
        json_request(
            Method::POST,
            &format!("/api/player/collections/{}/songs", id),
            None,
            json!({ "song_id": song_id }),
        )
    };
    let first = parse_json(app(&state).oneshot(add()).await.unwrap()).await;
    assert_eq!(first["message"], "Added to Focus");
    let second = parse_json(app(&state).oneshot(add()).await.unwrap()).await;
    assert_eq!(second["message"], "Already in Focus");

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/api/player/collections", None))
        .await
        .unwrap();
    let collections = parse_json(response).await;
    let focus = collections
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id.as_str())
        .unwrap();
    assert_eq!(focus["song_count"], 1);
    assert_eq!(focus["total_duration"], 200);
}

#[tokio::test]
async fn test_equalizer_band_bounds() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(json_request(Method::PUT, "/api/player/equalizer/3", None, json!({ "gain": 4.5 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let equalizer = parse_json(response).await;
    assert_eq!(equalizer["flat"], false);
    assert_eq!(equalizer["bands"][3]["gain"], 4.5);

    let response = app(&state)
        .oneshot(json_request(Method::PUT, "/api/player/equalizer/42", None, json!({ "gain": 1.0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&state)
        .oneshot(empty_request(Method::POST, "/api/player/equalizer/reset", None))
        .await
        .unwrap();
    assert_eq!(parse_json(response).await["flat"], true);
}

// ============================================================================
// HTML
// ============================================================================

#[tokio::test]
async fn test_index_page_renders() {
    let state = setup_test_app_state().await;
    load_song(&state, 180).await;

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("TuneStream"));
    assert!(html.contains("song-list"));
}

#[tokio::test]
async fn test_like_partial_updates_card_sidebar_and_toast() {
    let state = setup_test_app_state().await;
    let song_id = load_song(&state, 180).await;

    let response = app(&state)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/ui/songs/{}/like", song_id))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("collection_id="))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(&format!("song-{}", song_id)));
    assert!(html.contains("hx-swap-oob"));
    assert!(html.contains("Added to Liked Songs"));

    let session = state.session.read().await;
    let liked = session.collection("liked-songs").unwrap();
    assert_eq!(liked.songs.len(), 1);
}

#[tokio::test]
async fn test_unknown_collection_page_is_not_found() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(empty_request(Method::GET, "/collections/nope", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_without_music_folder_is_misconfigured() {
    let state = setup_test_app_state().await;

    let response = app(&state)
        .oneshot(empty_request(Method::POST, "/api/import", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(parse_json(response).await["error"], "Server misconfigured");
}
