use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::CurrentUser;
use super::{PageQuery, SearchQuery};
use crate::{
    db::{
        entities::{playlist, playlist_song, song},
        repositories::{
            NewPlaylist, Paginated, PlaylistChanges, PlaylistRepository, PositionUpdate,
        },
    },
    error::{AppError, Result},
    services::{catalog::clamp_limit, refresh_playlist},
    state::AppState,
};

#[derive(Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub is_collaborative: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Deserialize)]
pub struct AddSongRequest {
    pub song_id: Uuid,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub positions: Vec<PositionUpdate>,
}

#[derive(Deserialize, Default)]
pub struct DuplicateRequest {
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct PlaylistEntryResponse {
    pub position: i32,
    pub added_at: String,
    pub added_by: Option<Uuid>,
    pub song: song::Model,
}

#[derive(Serialize)]
pub struct PlaylistDetailResponse {
    pub playlist: playlist::Model,
    pub songs: Vec<PlaylistEntryResponse>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub removed: u64,
}

/// Reject blank names before anything reaches the store.
fn playlist_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name", "playlist name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Keep the session's copy of a playlist in step. Failures only cost freshness.
async fn sync_session(state: &AppState, playlist_id: Uuid) {
    if let Err(e) = refresh_playlist(&state.db, &state.session, playlist_id).await {
        tracing::warn!("Failed to refresh playlist {} in the session: {}", playlist_id, e);
    }
}

pub async fn list_public_playlists(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<playlist::Model>>> {
    let page = PlaylistRepository::new(state.db.clone())
        .find_public(query.page_request())
        .await?;
    Ok(Json(page))
}

pub async fn search_playlists(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<playlist::Model>>> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let playlists = PlaylistRepository::new(state.db.clone())
        .search(query.q.trim(), clamp_limit(query.limit, 20, 100))
        .await?;
    Ok(Json(playlists))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<playlist::Model>)> {
    let name = playlist_name(&request.name)?;
    let playlist = PlaylistRepository::new(state.db.clone())
        .create(NewPlaylist {
            user_id,
            name,
            description: request.description,
            cover_url: request.cover_url,
            is_public: request.is_public,
            is_collaborative: request.is_collaborative,
        })
        .await?;

    tracing::info!("User {} created playlist {} ({})", user_id, playlist.name, playlist.id);
    sync_session(&state, playlist.id).await;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Public playlists are visible to everyone, private ones to their owner only.
pub async fn get_playlist(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaylistDetailResponse>> {
    let repo = PlaylistRepository::new(state.db.clone());
    let (playlist, entries) = tokio::try_join!(repo.get(id), repo.songs(id))?;

    let viewer = user.map(|CurrentUser(id)| id);
    if !playlist.is_public && viewer != Some(playlist.user_id) {
        return Err(AppError::Authorization(format!("playlist {} is private", id)));
    }

    let songs = entries
        .into_iter()
        .map(|(entry, song): (playlist_song::Model, song::Model)| PlaylistEntryResponse {
            position: entry.position,
            added_at: entry.added_at.to_rfc3339(),
            added_by: entry.added_by,
            song,
        })
        .collect();

    Ok(Json(PlaylistDetailResponse { playlist, songs }))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(mut changes): Json<PlaylistChanges>,
) -> Result<Json<playlist::Model>> {
    if let Some(name) = &changes.name {
        changes.name = Some(playlist_name(name)?);
    }

    let repo = PlaylistRepository::new(state.db.clone());
    let existing = repo.get_for_update(id, user_id).await?;
    if changes.is_collaborative.is_some() && existing.user_id != user_id {
        return Err(AppError::Authorization(
            "only the owner can change collaboration settings".to_string(),
        ));
    }

    let playlist = repo.update(id, changes).await?;
    sync_session(&state, id).await;
    Ok(Json(playlist))
}

/// Only the owner may delete, even on collaborative playlists.
pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let repo = PlaylistRepository::new(state.db.clone());
    let playlist = repo.get(id).await?;
    if playlist.user_id != user_id {
        return Err(AppError::Authorization(format!(
            "user {} cannot delete playlist {}",
            user_id, id
        )));
    }

    repo.delete(id).await?;
    tracing::info!("Deleted playlist {}", id);
    sync_session(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_song(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddSongRequest>,
) -> Result<(StatusCode, Json<playlist_song::Model>)> {
    let repo = PlaylistRepository::new(state.db.clone());
    repo.get_for_update(id, user_id).await?;

    let entry = repo.add_song(id, request.song_id, Some(user_id)).await?;
    sync_session(&state, id).await;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_song(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((id, song_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    let repo = PlaylistRepository::new(state.db.clone());
    repo.get_for_update(id, user_id).await?;

    repo.remove_song(id, song_id).await?;
    sync_session(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<playlist_song::Model>>> {
    let repo = PlaylistRepository::new(state.db.clone());
    repo.get_for_update(id, user_id).await?;

    let entries = repo.reorder(id, request.positions).await?;
    sync_session(&state, id).await;
    Ok(Json(entries))
}

pub async fn shuffle_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<playlist_song::Model>>> {
    let repo = PlaylistRepository::new(state.db.clone());
    repo.get_for_update(id, user_id).await?;

    let entries = repo.shuffle(id).await?;
    sync_session(&state, id).await;
    Ok(Json(entries))
}

/// Copy a playlist into the caller's account. Private playlists can only be copied by their owner.
pub async fn duplicate_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DuplicateRequest>>,
) -> Result<(StatusCode, Json<playlist::Model>)> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let name = request.name.as_deref().map(playlist_name).transpose()?;

    let repo = PlaylistRepository::new(state.db.clone());
    let source = repo.get(id).await?;
    if !source.is_public && source.user_id != user_id {
        return Err(AppError::Authorization(format!("playlist {} is private", id)));
    }

    let copy = repo.duplicate(id, user_id, name).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn clear_playlist(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearResponse>> {
    let repo = PlaylistRepository::new(state.db.clone());
    repo.get_for_update(id, user_id).await?;

    let removed = repo.clear(id).await?;
    sync_session(&state, id).await;
    Ok(Json(ClearResponse { removed }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_name_is_trimmed() {
        assert_eq!(playlist_name("  Road Trip ").ok(), Some("Road Trip".to_string()));
    }

    #[test]
    fn test_blank_playlist_name_is_rejected() {
        match playlist_name("   ") {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "name"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
