use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::{
    db::repositories::{PreferencesChanges, UserPreferencesRepository},
    error::{AppError, Result},
    player::{
        band_label, AddOutcome, Collection, EqualizerSettings, PlayerState, RepeatMode,
        SessionSong, BAND_FREQUENCIES,
    },
    state::AppState,
};

#[derive(Deserialize)]
pub struct PlayRequest {
    pub song_id: Uuid,
    pub collection_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SeekRequest {
    pub position: i64,
}

#[derive(Deserialize)]
pub struct VolumeRequest {
    pub volume: i64,
}

#[derive(Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddToCollectionRequest {
    pub song_id: Uuid,
}

#[derive(Deserialize)]
pub struct BandRequest {
    pub gain: f32,
}

#[derive(Serialize)]
pub struct RepeatResponse {
    pub repeat: RepeatMode,
}

#[derive(Serialize)]
pub struct AddToCollectionResponse {
    pub outcome: AddOutcome,
    pub message: String,
}

#[derive(Serialize)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub song_count: usize,
    pub total_duration: u32,
}

impl From<&Collection> for CollectionSummary {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id.clone(),
            name: collection.name.clone(),
            description: collection.description.clone(),
            song_count: collection.songs.len(),
            total_duration: collection.total_duration(),
        }
    }
}

#[derive(Serialize)]
pub struct BandResponse {
    pub band: usize,
    pub frequency: u32,
    pub label: String,
    pub gain: f32,
}

#[derive(Serialize)]
pub struct EqualizerResponse {
    pub bands: Vec<BandResponse>,
    pub flat: bool,
}

impl From<&EqualizerSettings> for EqualizerResponse {
    fn from(settings: &EqualizerSettings) -> Self {
        Self {
            bands: settings
                .gains()
                .iter()
                .zip(BAND_FREQUENCIES)
                .enumerate()
                .map(|(band, (gain, frequency))| BandResponse {
                    band,
                    frequency,
                    label: band_label(frequency),
                    gain: *gain,
                })
                .collect(),
            flat: settings.is_flat(),
        }
    }
}

pub async fn get_state(State(state): State<AppState>) -> Json<PlayerState> {
    Json(state.session.read().await.player().clone())
}

pub async fn play(
    State(state): State<AppState>,
    Json(request): Json<PlayRequest>,
) -> Result<Json<PlayerState>> {
    let mut session = state.session.write().await;
    let player = session.play_song(request.song_id, request.collection_id.as_deref())?;
    Ok(Json(player.clone()))
}

pub async fn pause(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().pause();
    Json(session.player().clone())
}

pub async fn resume(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().resume();
    Json(session.player().clone())
}

pub async fn toggle_play(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().toggle_play();
    Json(session.player().clone())
}

pub async fn stop(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().stop();
    Json(session.player().clone())
}

pub async fn seek(
    State(state): State<AppState>,
    Json(request): Json<SeekRequest>,
) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().seek(request.position);
    Json(session.player().clone())
}

pub async fn set_volume(
    State(state): State<AppState>,
    Json(request): Json<VolumeRequest>,
) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().set_volume(request.volume);
    Json(session.player().clone())
}

pub async fn toggle_shuffle(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.player_mut().toggle_shuffle();
    Json(session.player().clone())
}

pub async fn toggle_repeat(State(state): State<AppState>) -> Json<RepeatResponse> {
    let repeat = state.session.write().await.player_mut().toggle_repeat();
    Json(RepeatResponse { repeat })
}

pub async fn next(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.next();
    Json(session.player().clone())
}

pub async fn previous(State(state): State<AppState>) -> Json<PlayerState> {
    let mut session = state.session.write().await;
    session.previous();
    Json(session.player().clone())
}

pub async fn list_songs(State(state): State<AppState>) -> Json<Vec<SessionSong>> {
    Json(state.session.read().await.songs().to_vec())
}

pub async fn like_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSong>> {
    let song = state.session.write().await.like(id)?;
    Ok(Json(song))
}

pub async fn dislike_song(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSong>> {
    let song = state.session.write().await.dislike(id)?;
    Ok(Json(song))
}

pub async fn list_collections(State(state): State<AppState>) -> Json<Vec<CollectionSummary>> {
    let session = state.session.read().await;
    Json(session.collections().iter().map(CollectionSummary::from).collect())
}

pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Collection>> {
    state
        .session
        .read()
        .await
        .collection(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Collection", id))
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CollectionSummary>)> {
    let mut session = state.session.write().await;
    let collection = session.create_collection(&request.name, request.description)?;
    Ok((StatusCode::CREATED, Json(CollectionSummary::from(collection))))
}

pub async fn add_to_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddToCollectionRequest>,
) -> Result<Json<AddToCollectionResponse>> {
    let (outcome, name) = state
        .session
        .write()
        .await
        .add_to_collection(&id, request.song_id)?;
    Ok(Json(AddToCollectionResponse {
        outcome,
        message: outcome.toast(&name),
    }))
}

pub async fn remove_from_collection(
    State(state): State<AppState>,
    Path((id, song_id)): Path<(String, Uuid)>,
) -> Result<StatusCode> {
    let removed = state
        .session
        .write()
        .await
        .remove_from_collection(&id, song_id)?;
    if !removed {
        return Err(AppError::not_found("CollectionSong", song_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_equalizer(State(state): State<AppState>) -> Json<EqualizerResponse> {
    Json(EqualizerResponse::from(state.session.read().await.equalizer()))
}

/// Set one band. Signed-in listeners also get the curve saved to their preferences.
pub async fn set_band(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(band): Path<usize>,
    Json(request): Json<BandRequest>,
) -> Result<Json<EqualizerResponse>> {
    let settings = {
        let mut session = state.session.write().await;
        session.equalizer_mut().set_gain(band, request.gain)?;
        *session.equalizer()
    };

    if let Some(CurrentUser(user_id)) = user {
        save_equalizer(&state, user_id, &settings).await;
    }
    Ok(Json(EqualizerResponse::from(&settings)))
}

pub async fn reset_equalizer(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
) -> Json<EqualizerResponse> {
    let settings = {
        let mut session = state.session.write().await;
        session.equalizer_mut().reset();
        *session.equalizer()
    };

    if let Some(CurrentUser(user_id)) = user {
        save_equalizer(&state, user_id, &settings).await;
    }
    Json(EqualizerResponse::from(&settings))
}

async fn save_equalizer(state: &AppState, user_id: Uuid, settings: &EqualizerSettings) {
    let changes = PreferencesChanges {
        equalizer: Some(settings.gains().to_vec()),
        ..Default::default()
    };
    if let Err(e) = UserPreferencesRepository::new(state.db.clone())
        .upsert(user_id, changes)
        .await
    {
        tracing::warn!("Failed to save equalizer for user {}: {}", user_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equalizer_response_labels_bands() {
        let mut settings = EqualizerSettings::default();
        settings.set_gain(5, 3.2).ok();
        let response = EqualizerResponse::from(&settings);

        assert_eq!(response.bands.len(), BAND_FREQUENCIES.len());
        assert_eq!(response.bands[0].label, "32Hz");
        assert_eq!(response.bands[5].label, "1kHz");
        assert_eq!(response.bands[5].gain, 3.0);
        assert!(!response.flat);
    }

    #[test]
    fn test_collection_summary_counts_songs() {
        let collection = Collection::new("road-trip", "Road Trip", None);
        let summary = CollectionSummary::from(&collection);
        assert_eq!(summary.song_count, 0);
        assert_eq!(summary.total_duration, 0);
    }
}
