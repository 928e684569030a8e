pub mod album;
pub mod artist;
pub mod base;
pub mod listening_history;
pub mod playlist;
pub mod song;
pub mod user;
pub mod user_follow;
pub mod user_library;
pub mod user_like;
pub mod user_preferences;

pub use album::{AlbumChanges, AlbumRepository, NewAlbum};
pub use artist::{ArtistChanges, ArtistRepository, NewArtist};
pub use base::{BaseRepository, DbResultExt, FindOptions, PageRequest, Paginated};
pub use listening_history::{
    compute_streaks, ListeningHistoryRepository, ListeningStats, NewPlay, PlayStreaks, TopArtist,
    TopTrack,
};
pub use playlist::{can_modify, NewPlaylist, PlaylistChanges, PlaylistRepository, PositionUpdate};
pub use song::{NewSong, SongChanges, SongRepository, SongStats};
pub use user::{NewUser, ProfileChanges, UserRepository};
pub use user_follow::{FollowStats, UserFollowRepository};
pub use user_library::{LibraryExport, LibraryStats, UserLibraryRepository};
pub use user_like::{LikeStats, PopularItem, UserLikeRepository};
pub use user_preferences::{PreferencesChanges, UserPreferencesRepository};
