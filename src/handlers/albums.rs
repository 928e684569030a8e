use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{page_request, LimitQuery, SearchQuery};
use crate::{
    db::{
        entities::{album, artist, song},
        enums::{AlbumType, ArtistRole},
        repositories::{AlbumChanges, AlbumRepository, NewAlbum, Paginated, SongRepository},
    },
    error::Result,
    services::CatalogService,
    state::AppState,
};

#[derive(Deserialize)]
pub struct ListAlbumsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub album_type: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

#[derive(Deserialize)]
pub struct AlbumTypeRequest {
    pub album_type: String,
}

#[derive(Serialize)]
pub struct AlbumArtistResponse {
    pub artist: artist::Model,
    pub role: ArtistRole,
}

#[derive(Serialize)]
pub struct AlbumDetailResponse {
    pub album: album::Model,
    pub artists: Vec<AlbumArtistResponse>,
}

/// Paginated albums, or a filtered (unpaginated) list when a filter is given.
pub async fn list_albums(
    State(state): State<AppState>,
    Query(query): Query<ListAlbumsQuery>,
) -> Result<Json<Paginated<album::Model>>> {
    let repo = AlbumRepository::new(state.db.clone());
    let request = page_request(query.page, query.limit);

    let filtered = if let Some(kind) = &query.album_type {
        let kind: AlbumType = kind.parse()?;
        Some(repo.find_by_type(kind).await?)
    } else if let Some(genre) = &query.genre {
        Some(CatalogService::new(state.db.clone()).albums_by_genre(genre).await?)
    } else if let Some(year) = query.year {
        Some(repo.find_by_year(year).await?)
    } else {
        None
    };

    let page = match filtered {
        Some(albums) => {
            let total = albums.len() as u64;
            let data = albums
                .into_iter()
                .skip(request.offset() as usize)
                .take(request.limit as usize)
                .collect();
            Paginated::new(data, total, request)
        }
        None => repo.list(request).await?,
    };
    Ok(Json(page))
}

pub async fn create_album(
    State(state): State<AppState>,
    Json(input): Json<NewAlbum>,
) -> Result<(StatusCode, Json<album::Model>)> {
    let album = CatalogService::new(state.db.clone()).create_album(input).await?;
    tracing::info!("Created album {} ({})", album.title, album.id);
    Ok((StatusCode::CREATED, Json(album)))
}

pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlbumDetailResponse>> {
    let repo = AlbumRepository::new(state.db.clone());
    let (album, artists) = tokio::try_join!(repo.get(id), repo.artists(id))?;

    Ok(Json(AlbumDetailResponse {
        album,
        artists: artists
            .into_iter()
            .map(|(artist, role)| AlbumArtistResponse { artist, role })
            .collect(),
    }))
}

pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<AlbumChanges>,
) -> Result<Json<album::Model>> {
    let album = CatalogService::new(state.db.clone())
        .update_album(id, changes)
        .await?;
    Ok(Json(album))
}

pub async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    AlbumRepository::new(state.db.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_album_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AlbumTypeRequest>,
) -> Result<Json<album::Model>> {
    let album = AlbumRepository::new(state.db.clone())
        .update_album_type(id, &request.album_type)
        .await?;
    Ok(Json(album))
}

/// Recompute song count and total duration from the album's songs.
pub async fn sync_album(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<album::Model>> {
    let album = AlbumRepository::new(state.db.clone()).sync_stats(id).await?;
    Ok(Json(album))
}

pub async fn album_songs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<song::Model>>> {
    AlbumRepository::new(state.db.clone()).get(id).await?;
    let songs = SongRepository::new(state.db.clone()).find_by_album(id).await?;
    Ok(Json(songs))
}

pub async fn recent_albums(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<album::Model>>> {
    let albums = CatalogService::new(state.db.clone())
        .recent_albums(query.limit)
        .await?;
    Ok(Json(albums))
}

pub async fn search_albums(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<album::Model>>> {
    let albums = CatalogService::new(state.db.clone())
        .search_albums(&query.q, query.limit)
        .await?;
    Ok(Json(albums))
}
