use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, Set};
use serde::Deserialize;
use uuid::Uuid;

use super::base::{BaseRepository, FindOptions};
use crate::db::entities::{user_preferences, EqualizerBands};
use crate::db::enums::AudioQuality;
use crate::error::{AppError, Result};
use crate::player::equalizer::{BAND_COUNT, MAX_GAIN_DB, MIN_GAIN_DB};

const ENTITY: &str = "UserPreferences";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesChanges {
    pub theme: Option<String>,
    pub audio_quality: Option<AudioQuality>,
    pub autoplay: Option<bool>,
    pub crossfade_seconds: Option<i32>,
    pub explicit_content: Option<bool>,
    pub equalizer: Option<Vec<f32>>,
    pub volume: Option<i32>,
}

impl PreferencesChanges {
    fn validate(&self) -> Result<()> {
        if let Some(crossfade) = self.crossfade_seconds {
            if !(0..=12).contains(&crossfade) {
                return Err(AppError::validation("crossfade_seconds", "must be between 0 and 12"));
            }
        }
        if let Some(volume) = self.volume {
            if !(0..=100).contains(&volume) {
                return Err(AppError::validation("volume", "must be between 0 and 100"));
            }
        }
        if let Some(bands) = &self.equalizer {
            if bands.len() != BAND_COUNT {
                return Err(AppError::validation(
                    "equalizer",
                    format!("expected {} bands, got {}", BAND_COUNT, bands.len()),
                ));
            }
            if bands.iter().any(|g| !(MIN_GAIN_DB..=MAX_GAIN_DB).contains(g)) {
                return Err(AppError::validation(
                    "equalizer",
                    format!("gains must be between {} and {} dB", MIN_GAIN_DB, MAX_GAIN_DB),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct UserPreferencesRepository {
    base: BaseRepository<user_preferences::Entity>,
}

impl UserPreferencesRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db, ENTITY),
        }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<user_preferences::Model>> {
        self.base
            .find_first(FindOptions::new().filter(user_preferences::Column::UserId.eq(user_id)))
            .await
    }

    /// Apply `changes` on top of the stored preferences, creating defaults first if needed.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        changes: PreferencesChanges,
    ) -> Result<user_preferences::Model> {
        changes.validate()?;
        let now = Utc::now().into();

        let mut active = match self.get(user_id).await? {
            Some(existing) => {
                let mut active: user_preferences::ActiveModel = existing.into();
                active.updated_at = Set(now);
                active
            }
            None => user_preferences::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                theme: Set("dark".to_string()),
                audio_quality: Set(AudioQuality::High),
                autoplay: Set(true),
                crossfade_seconds: Set(0),
                explicit_content: Set(true),
                equalizer: Set(EqualizerBands(vec![0.0; BAND_COUNT])),
                volume: Set(75),
                created_at: Set(now),
                updated_at: Set(now),
            },
        };

        if let Some(theme) = changes.theme {
            active.theme = Set(theme);
        }
        if let Some(quality) = changes.audio_quality {
            active.audio_quality = Set(quality);
        }
        if let Some(autoplay) = changes.autoplay {
            active.autoplay = Set(autoplay);
        }
        if let Some(crossfade) = changes.crossfade_seconds {
            active.crossfade_seconds = Set(crossfade);
        }
        if let Some(explicit) = changes.explicit_content {
            active.explicit_content = Set(explicit);
        }
        if let Some(bands) = changes.equalizer {
            active.equalizer = Set(EqualizerBands(bands));
        }
        if let Some(volume) = changes.volume {
            active.volume = Set(volume);
        }

        if active.id.is_unchanged() {
            self.base.update(active).await
        } else {
            self.base.create(active).await
        }
    }
}
