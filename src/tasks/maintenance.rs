use anyhow::Result;
use serde::Serialize;

use crate::db::repositories::{ListeningHistoryRepository, PlaylistRepository, UserRepository};
use crate::state::AppState;

/// Empty playlists are kept this long before cleanup.
pub const EMPTY_PLAYLIST_DAYS: i64 = 90;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub history_removed: u64,
    pub playlists_removed: u64,
    pub users_removed: u64,
}

pub async fn run_maintenance(state: AppState) -> Result<MaintenanceReport> {
    tracing::info!("Starting maintenance run");

    let history_removed = ListeningHistoryRepository::new(state.db.clone())
        .delete_old(state.config.history_retention_days)
        .await?;

    let playlists_removed = PlaylistRepository::new(state.db.clone())
        .delete_empty_older_than(EMPTY_PLAYLIST_DAYS)
        .await?;

    let users_removed = UserRepository::new(state.db.clone())
        .delete_inactive_users(state.config.inactive_user_days)
        .await?;

    let report = MaintenanceReport {
        history_removed,
        playlists_removed,
        users_removed,
    };
    tracing::info!(
        "Maintenance completed: {} history entries, {} empty playlists, {} inactive users removed",
        report.history_removed,
        report.playlists_removed,
        report.users_removed
    );
    Ok(report)
}
