use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::repositories::{ListeningHistoryRepository, NewPlay, SongRepository};

#[derive(Debug, Clone, Default)]
pub struct PlayContext {
    pub user_id: Option<Uuid>,
    pub play_duration_seconds: i32,
    pub completed: bool,
    pub device_type: Option<String>,
    pub source: Option<String>,
    pub source_id: Option<Uuid>,
}

/// Count a play and, for a known listener, log it to their history.
///
/// Failures are logged and dropped so playback never waits on bookkeeping.
/// Returns the new play count when the increment went through.
pub async fn record_play(db: &DatabaseConnection, song_id: Uuid, context: PlayContext) -> Option<i64> {
    let play_count = match SongRepository::new(db.clone())
        .increment_play_count(song_id)
        .await
    {
        Ok(song) => Some(song.play_count),
        Err(e) => {
            tracing::warn!("Failed to increment play count for song {}: {}", song_id, e);
            None
        }
    };

    if let Some(user_id) = context.user_id {
        let play = NewPlay {
            user_id,
            song_id,
            played_at: None,
            play_duration_seconds: context.play_duration_seconds.max(0),
            completed: context.completed,
            device_type: context.device_type,
            source: context.source,
            source_id: context.source_id,
        };
        if let Err(e) = ListeningHistoryRepository::new(db.clone()).record_play(play).await {
            tracing::warn!("Failed to record play of {} for user {}: {}", song_id, user_id, e);
        }
    }

    play_count
}
