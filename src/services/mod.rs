pub mod analytics;
pub mod catalog;
pub mod import;
pub mod session;

pub use analytics::{record_play, PlayContext};
pub use catalog::CatalogService;
pub use import::{ImportReport, LibraryImporter};
pub use session::{load_session, playlist_collection, refresh_playlist, to_session_songs};
