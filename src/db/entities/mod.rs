use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

pub mod album;
pub mod album_artist;
pub mod artist;
pub mod listening_history;
pub mod playlist;
pub mod playlist_song;
pub mod song;
pub mod song_artist;
pub mod user;
pub mod user_follow;
pub mod user_library;
pub mod user_like;
pub mod user_preferences;

pub use album::Entity as Album;
pub use album_artist::Entity as AlbumArtist;
pub use artist::Entity as Artist;
pub use listening_history::Entity as ListeningHistory;
pub use playlist::Entity as Playlist;
pub use playlist_song::Entity as PlaylistSong;
pub use song::Entity as Song;
pub use song_artist::Entity as SongArtist;
pub use user::Entity as User;
pub use user_follow::Entity as UserFollow;
pub use user_library::Entity as UserLibrary;
pub use user_like::Entity as UserLike;
pub use user_preferences::Entity as UserPreferences;

/// Genre tags stored as a JSON array so the column works on PostgreSQL and SQLite alike.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Genres(pub Vec<String>);

impl Genres {
    pub fn contains(&self, genre: &str) -> bool {
        self.0.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    pub fn shares_any(&self, other: &Genres) -> bool {
        self.0.iter().any(|g| other.contains(g))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<String>> for Genres {
    fn from(genres: Vec<String>) -> Self {
        Self(genres)
    }
}

/// Equalizer gains in dB, one entry per band.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct EqualizerBands(pub Vec<f32>);
