//! In-memory listening session: what is playing, the listener's collections and
//! their reactions to songs.

pub mod equalizer;
pub mod session;
pub mod state;

use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

pub use equalizer::{band_label, EqualizerSettings, BAND_COUNT, BAND_FREQUENCIES};
pub use session::{AddOutcome, Collection, LibrarySession, SessionSong, LIKED_SONGS_ID};
pub use state::{PlayerState, RepeatMode};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Unknown song: {0}")]
    UnknownSong(Uuid),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Equalizer band {0} does not exist")]
    InvalidBand(usize),

    #[error("Gain {0} is not a number")]
    InvalidGain(f32),

    #[error("Collection name cannot be empty")]
    EmptyName,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownSong(id) => AppError::not_found("Song", id),
            SessionError::UnknownCollection(id) => AppError::not_found("Collection", id),
            SessionError::InvalidBand(_) | SessionError::InvalidGain(_) => {
                AppError::validation("equalizer", err.to_string())
            }
            SessionError::EmptyName => AppError::validation("name", err.to_string()),
        }
    }
}
