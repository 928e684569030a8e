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
        entities::{album, artist, song},
        enums::FollowTarget,
        repositories::{
            ArtistChanges, ArtistRepository, NewArtist, Paginated, UserFollowRepository,
        },
    },
    error::Result,
    services::CatalogService,
    state::AppState,
};

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

#[derive(Deserialize)]
pub struct ListenersRequest {
    pub monthly_listeners: i64,
}

#[derive(Serialize)]
pub struct ArtistDetailResponse {
    pub artist: artist::Model,
    pub albums: Vec<album::Model>,
    pub followers: u64,
}

#[derive(Serialize)]
pub struct FollowResponse {
    pub following: bool,
    pub followers: u64,
}

pub async fn list_artists(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<artist::Model>>> {
    let page = ArtistRepository::new(state.db.clone())
        .list(query.page_request())
        .await?;
    Ok(Json(page))
}

pub async fn create_artist(
    State(state): State<AppState>,
    Json(input): Json<NewArtist>,
) -> Result<(StatusCode, Json<artist::Model>)> {
    let artist = CatalogService::new(state.db.clone()).create_artist(input).await?;
    tracing::info!("Created artist {} ({})", artist.name, artist.id);
    Ok((StatusCode::CREATED, Json(artist)))
}

pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArtistDetailResponse>> {
    let repo = ArtistRepository::new(state.db.clone());
    let follows = UserFollowRepository::new(state.db.clone());

    let (artist, albums, followers) = tokio::try_join!(
        repo.get(id),
        repo.albums(id),
        follows.follower_count(FollowTarget::Artist(id)),
    )?;

    Ok(Json(ArtistDetailResponse {
        artist,
        albums,
        followers,
    }))
}

pub async fn update_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ArtistChanges>,
) -> Result<Json<artist::Model>> {
    let artist = CatalogService::new(state.db.clone())
        .update_artist(id, changes)
        .await?;
    Ok(Json(artist))
}

pub async fn delete_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    ArtistRepository::new(state.db.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_verified(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<artist::Model>> {
    let artist = ArtistRepository::new(state.db.clone())
        .set_verified(id, request.verified)
        .await?;
    Ok(Json(artist))
}

pub async fn update_listeners(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ListenersRequest>,
) -> Result<Json<artist::Model>> {
    let artist = ArtistRepository::new(state.db.clone())
        .update_monthly_listeners(id, request.monthly_listeners)
        .await?;
    Ok(Json(artist))
}

pub async fn top_songs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<song::Model>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 50) as usize;
    let songs = ArtistRepository::new(state.db.clone())
        .top_songs(id, limit)
        .await?;
    Ok(Json(songs))
}

pub async fn popular_artists(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<artist::Model>>> {
    let artists = CatalogService::new(state.db.clone())
        .popular_artists(query.limit)
        .await?;
    Ok(Json(artists))
}

pub async fn search_artists(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<artist::Model>>> {
    let artists = CatalogService::new(state.db.clone())
        .search_artists(&query.q, query.limit)
        .await?;
    Ok(Json(artists))
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FollowResponse>> {
    ArtistRepository::new(state.db.clone()).get(id).await?;

    let follows = UserFollowRepository::new(state.db.clone());
    let target = FollowTarget::Artist(id);
    let following = follows.toggle_follow(user_id, target).await?;
    let followers = follows.follower_count(target).await?;

    Ok(Json(FollowResponse {
        following,
        followers,
    }))
}
