use axum::{
    extract::{Path, State},
    response::Html,
    Form,
};
use maud::Markup;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    player::{LibrarySession, SessionSong, LIKED_SONGS_ID},
    state::AppState,
    templates::{collection_page as render_collection, home_page, player_bar, sidebar_oob, song_card, toast},
};

/// Which collection a song card is shown in, sent by the card's `hx-vals`.
#[derive(Deserialize, Default)]
pub struct CardContext {
    pub collection_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AddToCollectionForm {
    pub collection_id: String,
}

#[derive(Deserialize)]
pub struct CreateCollectionForm {
    pub name: String,
    pub description: Option<String>,
}

fn render(parts: &[Markup]) -> Html<String> {
    Html(parts.iter().map(|m| m.0.as_str()).collect())
}

fn context(form: Option<Form<CardContext>>) -> Option<String> {
    form.and_then(|Form(c)| c.collection_id)
        .filter(|id| !id.is_empty())
}

/// Updated card plus the sidebar counts and a toast, all in one response.
fn reaction_response(
    session: &LibrarySession,
    song: &SessionSong,
    collection_id: Option<&str>,
    message: &str,
) -> Html<String> {
    render(&[
        song_card(song, session, collection_id),
        sidebar_oob(session, collection_id),
        toast(message),
    ])
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.read().await;
    Html(home_page(&session).into_string())
}

pub async fn collection_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let session = state.session.read().await;
    let collection = session
        .collection(&id)
        .ok_or_else(|| AppError::not_found("Collection", &id))?;
    Ok(Html(render_collection(&session, collection).into_string()))
}

pub async fn like_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: Option<Form<CardContext>>,
) -> Result<Html<String>> {
    let collection_id = context(form);
    let mut session = state.session.write().await;
    let song = session.like(id)?;

    let liked_name = session
        .collection(LIKED_SONGS_ID)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let message = if song.liked {
        format!("Added to {}", liked_name)
    } else {
        format!("Removed from {}", liked_name)
    };
    Ok(reaction_response(&session, &song, collection_id.as_deref(), &message))
}

pub async fn dislike_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: Option<Form<CardContext>>,
) -> Result<Html<String>> {
    let collection_id = context(form);
    let mut session = state.session.write().await;
    let song = session.dislike(id)?;

    let message = if song.disliked {
        "We'll play less like this"
    } else {
        "Dislike removed"
    };
    Ok(reaction_response(&session, &song, collection_id.as_deref(), message))
}

pub async fn play_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: Option<Form<CardContext>>,
) -> Result<Html<String>> {
    let collection_id = context(form);
    let mut session = state.session.write().await;
    let player = session.play_song(id, collection_id.as_deref())?;
    Ok(Html(player_bar(player).into_string()))
}

pub async fn add_to_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<AddToCollectionForm>,
) -> Result<Html<String>> {
    let mut session = state.session.write().await;
    let (outcome, name) = session.add_to_collection(&form.collection_id, id)?;
    Ok(render(&[sidebar_oob(&session, None), toast(&outcome.toast(&name))]))
}

pub async fn create_collection(
    State(state): State<AppState>,
    Form(form): Form<CreateCollectionForm>,
) -> Result<Html<String>> {
    let mut session = state.session.write().await;
    let name = session
        .create_collection(&form.name, form.description)?
        .name
        .clone();
    Ok(render(&[
        sidebar_oob(&session, None),
        toast(&format!("Created {}", name)),
    ]))
}

pub async fn toggle_play(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.write().await;
    session.player_mut().toggle_play();
    Html(player_bar(session.player()).into_string())
}

pub async fn next(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.write().await;
    session.next();
    Html(player_bar(session.player()).into_string())
}

pub async fn previous(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.write().await;
    session.previous();
    Html(player_bar(session.player()).into_string())
}
