use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::{page_request, SearchQuery};
use crate::{
    db::{
        entities::{playlist, user, user_preferences},
        repositories::{
            NewUser, Paginated, PlaylistRepository, PreferencesChanges, ProfileChanges,
            UserPreferencesRepository, UserRepository,
        },
    },
    error::{AppError, Result},
    services::catalog::clamp_limit,
    state::AppState,
};

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Deserialize)]
pub struct SubscriptionRequest {
    pub tier: String,
}

fn validate_new_user(input: &NewUser) -> Result<()> {
    if input.username.trim().is_empty() {
        return Err(AppError::validation("username", "username is required"));
    }
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("email", "a valid email address is required"));
    }
    Ok(())
}

/// Users may only change their own account.
fn ensure_self(caller: Uuid, target: Uuid) -> Result<()> {
    if caller != target {
        return Err(AppError::Authorization(format!(
            "user {} cannot modify user {}",
            caller, target
        )));
    }
    Ok(())
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Paginated<user::Model>>> {
    let repo = UserRepository::new(state.db.clone());
    let request = page_request(query.page, query.limit);
    let page = if query.active_only {
        repo.find_active(request).await?
    } else {
        repo.list(request).await?
    };
    Ok(Json(page))
}

pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<user::Model>>> {
    let users = UserRepository::new(state.db.clone())
        .search(&query.q, clamp_limit(query.limit, 20, 100))
        .await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<user::Model>)> {
    validate_new_user(&input)?;

    let repo = UserRepository::new(state.db.clone());
    if repo.username_exists(&input.username).await? {
        return Err(AppError::Duplicate {
            entity: "User",
            field: "username".to_string(),
        });
    }
    if repo.email_exists(&input.email).await? {
        return Err(AppError::Duplicate {
            entity: "User",
            field: "email".to_string(),
        });
    }

    let user = repo.create(input).await?;
    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<user::Model>> {
    let user = UserRepository::new(state.db.clone()).get(id).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<user::Model>> {
    ensure_self(caller, id)?;
    let user = UserRepository::new(state.db.clone())
        .update_profile(id, changes)
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    ensure_self(caller, id)?;
    UserRepository::new(state.db.clone()).delete(id).await?;
    tracing::info!("Deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_subscription(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<Json<user::Model>> {
    ensure_self(caller, id)?;
    let user = UserRepository::new(state.db.clone())
        .update_subscription_tier(id, &request.tier)
        .await?;
    Ok(Json(user))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<user::Model>> {
    ensure_self(caller, id)?;
    let user = UserRepository::new(state.db.clone()).deactivate(id).await?;
    Ok(Json(user))
}

pub async fn reactivate_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<user::Model>> {
    ensure_self(caller, id)?;
    let user = UserRepository::new(state.db.clone()).reactivate(id).await?;
    Ok(Json(user))
}

/// A user's playlists. Other callers only see the public ones.
pub async fn user_playlists(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<playlist::Model>>> {
    UserRepository::new(state.db.clone()).get(id).await?;
    let playlists = PlaylistRepository::new(state.db.clone())
        .find_by_user(id)
        .await?;

    let is_owner = caller.map(|CurrentUser(c)| c) == Some(id);
    Ok(Json(
        playlists
            .into_iter()
            .filter(|p| is_owner || p.is_public)
            .collect(),
    ))
}

pub async fn get_preferences(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<user_preferences::Model>> {
    ensure_self(caller, id)?;
    UserPreferencesRepository::new(state.db.clone())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("UserPreferences", id))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<PreferencesChanges>,
) -> Result<Json<user_preferences::Model>> {
    ensure_self(caller, id)?;
    UserRepository::new(state.db.clone()).get(id).await?;
    let preferences = UserPreferencesRepository::new(state.db.clone())
        .upsert(id, changes)
        .await?;
    Ok(Json(preferences))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::SubscriptionTier;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            display_name: None,
            avatar_url: None,
            subscription_tier: SubscriptionTier::Free,
            country: None,
            preferred_language: None,
        }
    }

    #[test]
    fn test_validate_new_user() {
        assert!(validate_new_user(&new_user("mira", "mira@example.com")).is_ok());
        assert!(matches!(
            validate_new_user(&new_user("  ", "mira@example.com")),
            Err(AppError::Validation { field, .. }) if field == "username"
        ));
        assert!(matches!(
            validate_new_user(&new_user("mira", "not-an-email")),
            Err(AppError::Validation { field, .. }) if field == "email"
        ));
    }

    #[test]
    fn test_ensure_self() {
        let id = Uuid::new_v4();
        assert!(ensure_self(id, id).is_ok());
        assert!(matches!(
            ensure_self(id, Uuid::new_v4()),
            Err(AppError::Authorization(_))
        ));
    }
}
