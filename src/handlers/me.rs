//! Endpoints scoped to the calling user: likes, follows, saved library items
//! and listening history.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::auth::CurrentUser;
use super::page_request;
use crate::{
    db::{
        entities::{listening_history, song},
        enums::{FollowTarget, FollowableType, LibraryItem, LibraryItemType, LikeTarget, LikeableType},
        repositories::{
            FollowStats, LibraryExport, LibraryStats, LikeStats, ListeningHistoryRepository,
            ListeningStats, Paginated, PlayStreaks, TopArtist, TopTrack, UserFollowRepository,
            UserLibraryRepository, UserLikeRepository,
        },
    },
    error::Result,
    state::AppState,
};

const DEFAULT_TOP_LIMIT: usize = 10;
const MAX_TOP_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct KindQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize)]
pub struct LibraryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub device: Option<String>,
    pub source: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct WindowQuery {
    pub limit: Option<usize>,
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct ToggleResponse<T> {
    pub target: T,
    pub active: bool,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub removed: u64,
}

#[derive(Serialize)]
pub struct StreaksResponse {
    #[serde(flatten)]
    pub streaks: PlayStreaks,
    pub last_played_at: Option<DateTime<Utc>>,
}

fn top_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
}

fn paginate_all<T>(items: Vec<T>, page: Option<u64>, limit: Option<u64>) -> Paginated<T> {
    let request = page_request(page, limit);
    let total = items.len() as u64;
    let data = items
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.limit as usize)
        .collect();
    Paginated::new(data, total, request)
}

pub async fn list_likes(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<LikeTarget>>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<LikeableType>)
        .transpose()?;
    let likes = UserLikeRepository::new(state.db.clone())
        .liked_items(user_id, kind)
        .await?;
    Ok(Json(likes))
}

pub async fn liked_songs(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<song::Model>>> {
    let songs = UserLikeRepository::new(state.db.clone())
        .liked_songs(user_id)
        .await?;
    Ok(Json(songs))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(target): Json<LikeTarget>,
) -> Result<Json<ToggleResponse<LikeTarget>>> {
    let active = UserLikeRepository::new(state.db.clone())
        .toggle_like(user_id, target)
        .await?;
    Ok(Json(ToggleResponse { target, active }))
}

pub async fn like_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<LikeStats>> {
    let stats = UserLikeRepository::new(state.db.clone()).stats(user_id).await?;
    Ok(Json(stats))
}

pub async fn list_follows(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<FollowTarget>>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<FollowableType>)
        .transpose()?;
    let follows = UserFollowRepository::new(state.db.clone())
        .following(user_id, kind)
        .await?;
    Ok(Json(follows))
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(target): Json<FollowTarget>,
) -> Result<Json<ToggleResponse<FollowTarget>>> {
    let active = UserFollowRepository::new(state.db.clone())
        .toggle_follow(user_id, target)
        .await?;
    Ok(Json(ToggleResponse { target, active }))
}

pub async fn follow_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<FollowStats>> {
    let stats = UserFollowRepository::new(state.db.clone()).stats(user_id).await?;
    Ok(Json(stats))
}

pub async fn list_library(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Paginated<LibraryItem>>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<LibraryItemType>)
        .transpose()?;
    let items = UserLibraryRepository::new(state.db.clone())
        .items(user_id, kind, page_request(query.page, query.limit))
        .await?;
    Ok(Json(items))
}

pub async fn toggle_library(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(item): Json<LibraryItem>,
) -> Result<Json<ToggleResponse<LibraryItem>>> {
    let active = UserLibraryRepository::new(state.db.clone())
        .toggle_save(user_id, item)
        .await?;
    Ok(Json(ToggleResponse { target: item, active }))
}

pub async fn clear_library(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<KindQuery>,
) -> Result<Json<ClearResponse>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<LibraryItemType>)
        .transpose()?;
    let removed = UserLibraryRepository::new(state.db.clone())
        .clear(user_id, kind)
        .await?;
    Ok(Json(ClearResponse { removed }))
}

pub async fn library_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<LibraryStats>> {
    let stats = UserLibraryRepository::new(state.db.clone()).stats(user_id).await?;
    Ok(Json(stats))
}

pub async fn export_library(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<LibraryExport>> {
    let export = UserLibraryRepository::new(state.db.clone())
        .export(user_id)
        .await?;
    Ok(Json(export))
}

/// Listening history, newest first. Device, source and date filters are exclusive,
/// checked in that order.
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Paginated<listening_history::Model>>> {
    let repo = ListeningHistoryRepository::new(state.db.clone());

    let page = if let Some(device) = &query.device {
        paginate_all(repo.find_by_device(user_id, device).await?, query.page, query.limit)
    } else if let Some(source) = &query.source {
        paginate_all(repo.find_by_source(user_id, source).await?, query.page, query.limit)
    } else if query.from.is_some() || query.to.is_some() {
        let from = query.from.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let to = query.to.unwrap_or_else(Utc::now);
        let plays = repo
            .find_by_date_range(user_id, from.into(), to.into())
            .await?;
        paginate_all(plays, query.page, query.limit)
    } else {
        repo.find_by_user(user_id, page_request(query.page, query.limit))
            .await?
    };
    Ok(Json(page))
}

pub async fn listening_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ListeningStats>> {
    let stats = ListeningHistoryRepository::new(state.db.clone())
        .listening_stats(user_id, query.days)
        .await?;
    Ok(Json(stats))
}

pub async fn streaks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<StreaksResponse>> {
    let repo = ListeningHistoryRepository::new(state.db.clone());
    let (streaks, last_played_at) =
        tokio::try_join!(repo.play_streaks(user_id), repo.last_played_at(user_id))?;
    Ok(Json(StreaksResponse {
        streaks,
        last_played_at,
    }))
}

pub async fn top_tracks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<TopTrack>>> {
    let tracks = ListeningHistoryRepository::new(state.db.clone())
        .top_tracks(user_id, top_limit(query.limit), query.days)
        .await?;
    Ok(Json(tracks))
}

pub async fn top_artists(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<TopArtist>>> {
    let artists = ListeningHistoryRepository::new(state.db.clone())
        .top_artists(user_id, top_limit(query.limit), query.days)
        .await?;
    Ok(Json(artists))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_limit_is_clamped() {
        assert_eq!(top_limit(None), DEFAULT_TOP_LIMIT);
        assert_eq!(top_limit(Some(0)), 1);
        assert_eq!(top_limit(Some(500)), MAX_TOP_LIMIT);
    }

    #[test]
    fn test_paginate_all_slices_pages() {
        let page = paginate_all((1..=25).collect::<Vec<i32>>(), Some(3), Some(10));
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }
}
