use std::path::PathBuf;

use axum::{extract::State, Json};

use crate::{
    db::repositories::SongRepository,
    error::{AppError, Result},
    services::{to_session_songs, ImportReport, LibraryImporter},
    state::AppState,
};

const SESSION_REFRESH_LIMIT: u64 = 200;

/// Scan `MUSIC_FOLDER` and import every new track, then refresh the session catalog.
pub async fn import_library(State(state): State<AppState>) -> Result<Json<ImportReport>> {
    let folder = state
        .config
        .music_folder_path
        .as_deref()
        .map(PathBuf::from)
        .ok_or_else(|| AppError::Configuration("MUSIC_FOLDER is not set".to_string()))?;

    let report = LibraryImporter::new(state.db.clone())
        .import_folder(&folder)
        .await?;

    if report.imported > 0 {
        let songs = SongRepository::new(state.db.clone())
            .find_recent(1, SESSION_REFRESH_LIMIT)
            .await?;
        let songs = to_session_songs(&state.db, songs).await?;
        state.session.write().await.load_songs(songs);
    }

    Ok(Json(report))
}
