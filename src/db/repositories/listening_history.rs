use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    prelude::DateTimeWithTimeZone, sea_query::Expr, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::base::{days_ago, BaseRepository, DbResultExt, FindOptions, PageRequest, Paginated};
use crate::db::entities::{artist, listening_history, song, song_artist};
use crate::db::enums::ArtistRole;
use crate::error::{AppError, Result};

const ENTITY: &str = "ListeningHistory";

pub const DEFAULT_RETENTION_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlay {
    pub user_id: Uuid,
    pub song_id: Uuid,
    pub played_at: Option<DateTimeWithTimeZone>,
    #[serde(default)]
    pub play_duration_seconds: i32,
    #[serde(default)]
    pub completed: bool,
    pub device_type: Option<String>,
    pub source: Option<String>,
    pub source_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopTrack {
    pub song: song::Model,
    pub play_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopArtist {
    pub artist: artist::Model,
    pub play_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListeningStats {
    pub total_plays: u64,
    pub completed_plays: u64,
    pub total_seconds: i64,
    pub unique_songs: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayStreaks {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Day streaks over distinct play dates.
///
/// The current streak ends at the latest date and only counts while that date is
/// `today` or the day before.
pub fn compute_streaks(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> PlayStreaks {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for date in dates {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(*date) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*date);
    }

    let current = match previous {
        Some(last) if last == today || last.succ_opt() == Some(today) => run,
        _ => 0,
    };

    PlayStreaks {
        current_streak: current,
        longest_streak: longest,
    }
}

#[derive(Clone)]
pub struct ListeningHistoryRepository {
    base: BaseRepository<listening_history::Entity>,
}

impl ListeningHistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub fn base(&self) -> &BaseRepository<listening_history::Entity> {
        &self.base
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.db()
    }

    pub async fn record_play(&self, play: NewPlay) -> Result<listening_history::Model> {
        if play.play_duration_seconds < 0 {
            return Err(AppError::validation("play_duration_seconds", "cannot be negative"));
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let entry = listening_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(play.user_id),
            song_id: Set(play.song_id),
            played_at: Set(play.played_at.unwrap_or(now)),
            play_duration_seconds: Set(play.play_duration_seconds),
            completed: Set(play.completed),
            device_type: Set(play.device_type),
            source: Set(play.source),
            source_id: Set(play.source_id),
            created_at: Set(now),
        };

        self.base.create(entry).await
    }

    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<Paginated<listening_history::Model>> {
        self.base
            .find_many_paginated(
                FindOptions::new()
                    .filter(listening_history::Column::UserId.eq(user_id))
                    .order_desc(listening_history::Column::PlayedAt),
                request,
            )
            .await
    }

    pub async fn find_recent_for_user(&self, user_id: Uuid, limit: u64) -> Result<Vec<listening_history::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(listening_history::Column::UserId.eq(user_id))
                    .order_desc(listening_history::Column::PlayedAt)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_song(&self, song_id: Uuid, limit: u64) -> Result<Vec<listening_history::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(listening_history::Column::SongId.eq(song_id))
                    .order_desc(listening_history::Column::PlayedAt)
                    .limit(limit),
            )
            .await
    }

    pub async fn find_by_date_range(
        &self,
        user_id: Uuid,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<listening_history::Model>> {
        if start > end {
            return Err(AppError::validation("played_at", "start is after end"));
        }
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::all()
                            .add(listening_history::Column::UserId.eq(user_id))
                            .add(listening_history::Column::PlayedAt.between(start, end)),
                    )
                    .order_desc(listening_history::Column::PlayedAt),
            )
            .await
    }

    pub async fn find_by_device(&self, user_id: Uuid, device_type: &str) -> Result<Vec<listening_history::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::all()
                            .add(listening_history::Column::UserId.eq(user_id))
                            .add(listening_history::Column::DeviceType.eq(device_type)),
                    )
                    .order_desc(listening_history::Column::PlayedAt),
            )
            .await
    }

    pub async fn find_by_source(&self, user_id: Uuid, source: &str) -> Result<Vec<listening_history::Model>> {
        self.base
            .find_many(
                FindOptions::new()
                    .filter(
                        Condition::all()
                            .add(listening_history::Column::UserId.eq(user_id))
                            .add(listening_history::Column::Source.eq(source)),
                    )
                    .order_desc(listening_history::Column::PlayedAt),
            )
            .await
    }

    /// Drop plays older than `days` days.
    pub async fn delete_old(&self, days: i64) -> Result<u64> {
        let removed = self
            .base
            .delete_many(
                Condition::all().add(listening_history::Column::PlayedAt.lt(days_ago(days))),
            )
            .await?;
        tracing::info!("Deleted {} listening history entries older than {} days", removed, days);
        Ok(removed)
    }

    fn completed_window(user_id: Uuid, days: Option<i64>) -> Condition {
        let mut condition = Condition::all()
            .add(listening_history::Column::UserId.eq(user_id))
            .add(listening_history::Column::Completed.eq(true));
        if let Some(days) = days {
            condition = condition.add(listening_history::Column::PlayedAt.gte(days_ago(days)));
        }
        condition
    }

    async fn play_counts(&self, user_id: Uuid, days: Option<i64>) -> Result<Vec<(Uuid, i64)>> {
        listening_history::Entity::find()
            .select_only()
            .column(listening_history::Column::SongId)
            .column_as(Expr::col(listening_history::Column::Id).count(), "plays")
            .filter(Self::completed_window(user_id, days))
            .group_by(listening_history::Column::SongId)
            .order_by_desc(Expr::col(listening_history::Column::Id).count())
            .into_tuple()
            .all(self.db())
            .await
            .for_entity(ENTITY)
    }

    /// Most completed songs, optionally limited to the last `days` days.
    pub async fn top_tracks(&self, user_id: Uuid, limit: usize, days: Option<i64>) -> Result<Vec<TopTrack>> {
        let mut counts = self.play_counts(user_id, days).await?;
        counts.truncate(limit);
        let ids: Vec<Uuid> = counts.iter().map(|(id, _)| *id).collect();

        let songs: HashMap<Uuid, song::Model> = song::Entity::find()
            .filter(song::Column::Id.is_in(ids))
            .all(self.db())
            .await
            .for_entity("Song")?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(counts
            .into_iter()
            .filter_map(|(id, play_count)| {
                songs.get(&id).cloned().map(|song| TopTrack { song, play_count })
            })
            .collect())
    }

    /// Artists ranked by completed plays of songs where they are the primary artist.
    pub async fn top_artists(&self, user_id: Uuid, limit: usize, days: Option<i64>) -> Result<Vec<TopArtist>> {
        let counts = self.play_counts(user_id, days).await?;
        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let links = song_artist::Entity::find()
            .filter(song_artist::Column::SongId.is_in(counts.iter().map(|(id, _)| *id)))
            .filter(song_artist::Column::Role.eq(ArtistRole::Primary))
            .all(self.db())
            .await
            .for_entity("SongArtist")?;

        let per_song: HashMap<Uuid, i64> = counts.into_iter().collect();
        let mut per_artist: HashMap<Uuid, i64> = HashMap::new();
        for link in links {
            if let Some(plays) = per_song.get(&link.song_id) {
                *per_artist.entry(link.artist_id).or_default() += plays;
            }
        }

        let artists: HashMap<Uuid, artist::Model> = artist::Entity::find()
            .filter(artist::Column::Id.is_in(per_artist.keys().copied()))
            .all(self.db())
            .await
            .for_entity("Artist")?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut ranked: Vec<TopArtist> = per_artist
            .into_iter()
            .filter_map(|(id, play_count)| {
                artists.get(&id).cloned().map(|artist| TopArtist { artist, play_count })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.play_count
                .cmp(&a.play_count)
                .then_with(|| a.artist.name.cmp(&b.artist.name))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub async fn listening_stats(&self, user_id: Uuid, days: Option<i64>) -> Result<ListeningStats> {
        let mut condition = Condition::all().add(listening_history::Column::UserId.eq(user_id));
        if let Some(days) = days {
            condition = condition.add(listening_history::Column::PlayedAt.gte(days_ago(days)));
        }

        let plays: Vec<(Uuid, i32, bool)> = listening_history::Entity::find()
            .select_only()
            .column(listening_history::Column::SongId)
            .column(listening_history::Column::PlayDurationSeconds)
            .column(listening_history::Column::Completed)
            .filter(condition)
            .into_tuple()
            .all(self.db())
            .await
            .for_entity(ENTITY)?;

        let total_plays = plays.len() as u64;
        let completed_plays = plays.iter().filter(|(_, _, done)| *done).count() as u64;
        let total_seconds = plays.iter().map(|(_, secs, _)| i64::from(*secs)).sum();
        let unique_songs = plays.iter().map(|(id, _, _)| *id).collect::<HashSet<_>>().len() as u64;
        let completion_rate = if total_plays > 0 {
            completed_plays as f64 / total_plays as f64
        } else {
            0.0
        };

        Ok(ListeningStats {
            total_plays,
            completed_plays,
            total_seconds,
            unique_songs,
            completion_rate,
        })
    }

    pub async fn play_streaks(&self, user_id: Uuid) -> Result<PlayStreaks> {
        let played: Vec<DateTimeWithTimeZone> = listening_history::Entity::find()
            .select_only()
            .column(listening_history::Column::PlayedAt)
            .filter(Self::completed_window(user_id, None))
            .into_tuple()
            .all(self.db())
            .await
            .for_entity(ENTITY)?;

        let dates: BTreeSet<NaiveDate> = played
            .into_iter()
            .map(|at| at.with_timezone(&Utc).date_naive())
            .collect();

        Ok(compute_streaks(&dates, Utc::now().date_naive()))
    }

    pub async fn last_played_at(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let latest = self.find_recent_for_user(user_id, 1).await?;
        Ok(latest.first().map(|p| p.played_at.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_streaks_with_current_and_older_run() {
        let today = date(2024, 3, 10);
        let dates: BTreeSet<NaiveDate> = [
            date(2024, 2, 1),
            date(2024, 2, 2),
            date(2024, 2, 3),
            date(2024, 2, 4),
            date(2024, 3, 8),
            date(2024, 3, 9),
            date(2024, 3, 10),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            compute_streaks(&dates, today),
            PlayStreaks {
                current_streak: 3,
                longest_streak: 4
            }
        );
    }

    #[test]
    fn test_streak_still_counts_from_yesterday() {
        let dates: BTreeSet<NaiveDate> = [date(2024, 3, 8), date(2024, 3, 9)].into_iter().collect();
        let streaks = compute_streaks(&dates, date(2024, 3, 10));
        assert_eq!(streaks.current_streak, 2);
    }

    #[test]
    fn test_stale_streak_is_zero() {
        let dates: BTreeSet<NaiveDate> = [date(2024, 3, 1), date(2024, 3, 2)].into_iter().collect();
        let streaks = compute_streaks(&dates, date(2024, 3, 10));
        assert_eq!(streaks.current_streak, 0);
        assert_eq!(streaks.longest_streak, 2);
    }

    #[test]
    fn test_no_plays() {
        let streaks = compute_streaks(&BTreeSet::new(), date(2024, 3, 10));
        assert_eq!(
            streaks,
            PlayStreaks {
                current_streak: 0,
                longest_streak: 0
            }
        );
    }
}
