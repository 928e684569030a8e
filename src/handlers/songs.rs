use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::CurrentUser;
use super::{LimitQuery, PageQuery, SearchQuery};
use crate::{
    db::{
        entities::song,
        repositories::{NewSong, Paginated, SongChanges, SongRepository, SongStats},
    },
    error::Result,
    services::{record_play, CatalogService, PlayContext},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub play_duration_seconds: i32,
    #[serde(default)]
    pub completed: bool,
    pub device_type: Option<String>,
    pub source: Option<String>,
    pub source_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct PlayResponse {
    pub song_id: Uuid,
    pub play_count: Option<i64>,
}

pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<song::Model>>> {
    let page = SongRepository::new(state.db.clone())
        .list(query.page_request())
        .await?;
    Ok(Json(page))
}

pub async fn create_song(
    State(state): State<AppState>,
    Json(input): Json<NewSong>,
) -> Result<(StatusCode, Json<song::Model>)> {
    let song = CatalogService::new(state.db.clone()).create_song(input).await?;
    tracing::info!("Created song {} ({})", song.title, song.id);
    Ok((StatusCode::CREATED, Json(song)))
}

pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<song::Model>> {
    let song = SongRepository::new(state.db.clone()).get(id).await?;
    Ok(Json(song))
}

pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<SongChanges>,
) -> Result<Json<song::Model>> {
    let song = CatalogService::new(state.db.clone())
        .update_song(id, changes)
        .await?;
    Ok(Json(song))
}

pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let (_, playlist_ids) = CatalogService::new(state.db.clone()).delete_song(id).await?;
    state.session.write().await.remove_song(id);
    tracing::info!("Deleted song {} from the catalog and {} playlists", id, playlist_ids.len());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn popular_songs(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<song::Model>>> {
    let songs = CatalogService::new(state.db.clone())
        .popular_songs(query.limit)
        .await?;
    Ok(Json(songs))
}

pub async fn search_songs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<song::Model>>> {
    let songs = CatalogService::new(state.db.clone())
        .search_songs(&query.q, query.limit)
        .await?;
    Ok(Json(songs))
}

pub async fn similar_songs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<song::Model>>> {
    let songs = SongRepository::new(state.db.clone())
        .find_similar(id, query.limit.unwrap_or(10).clamp(1, 50))
        .await?;
    Ok(Json(songs))
}

pub async fn song_stats(State(state): State<AppState>) -> Result<Json<SongStats>> {
    let stats = SongRepository::new(state.db.clone()).stats().await?;
    Ok(Json(stats))
}

/// Count a play. Anonymous plays only bump the counter.
pub async fn play_song(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<PlayRequest>>,
) -> Json<PlayResponse> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let context = PlayContext {
        user_id: user.map(|CurrentUser(id)| id),
        play_duration_seconds: request.play_duration_seconds,
        completed: request.completed,
        device_type: request.device_type,
        source: request.source,
        source_id: request.source_id,
    };

    let play_count = record_play(&state.db, id, context).await;
    Json(PlayResponse {
        song_id: id,
        play_count,
    })
}
