pub mod albums;
pub mod artists;
pub mod auth;
pub mod health;
pub mod html;
pub mod import;
pub mod me;
pub mod player;
pub mod playlists;
pub mod songs;
pub mod users;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;

use crate::db::repositories::PageRequest;
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Build a page request from optional query values, defaulting to page 1 of 10.
pub fn page_request(page: Option<u64>, limit: Option<u64>) -> PageRequest {
    PageRequest::new(
        page.unwrap_or(1),
        limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        page_request(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u64>,
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Songs
        .route("/songs", get(songs::list_songs).post(songs::create_song))
        .route("/songs/popular", get(songs::popular_songs))
        .route("/songs/search", get(songs::search_songs))
        .route("/songs/stats", get(songs::song_stats))
        .route(
            "/songs/:id",
            get(songs::get_song)
                .patch(songs::update_song)
                .delete(songs::delete_song),
        )
        .route("/songs/:id/similar", get(songs::similar_songs))
        .route("/songs/:id/play", post(songs::play_song))

        // Albums
        .route("/albums", get(albums::list_albums).post(albums::create_album))
        .route("/albums/recent", get(albums::recent_albums))
        .route("/albums/search", get(albums::search_albums))
        .route(
            "/albums/:id",
            get(albums::get_album)
                .patch(albums::update_album)
                .delete(albums::delete_album),
        )
        .route("/albums/:id/type", put(albums::update_album_type))
        .route("/albums/:id/sync", post(albums::sync_album))
        .route("/albums/:id/songs", get(albums::album_songs))

        // Artists
        .route("/artists", get(artists::list_artists).post(artists::create_artist))
        .route("/artists/popular", get(artists::popular_artists))
        .route("/artists/search", get(artists::search_artists))
        .route(
            "/artists/:id",
            get(artists::get_artist)
                .patch(artists::update_artist)
                .delete(artists::delete_artist),
        )
        .route("/artists/:id/top-songs", get(artists::top_songs))
        .route("/artists/:id/verified", put(artists::set_verified))
        .route("/artists/:id/listeners", put(artists::update_listeners))
        .route("/artists/:id/follow", post(artists::toggle_follow))

        // Playlists
        .route(
            "/playlists",
            get(playlists::list_public_playlists).post(playlists::create_playlist),
        )
        .route("/playlists/search", get(playlists::search_playlists))
        .route(
            "/playlists/:id",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlists/:id/songs", post(playlists::add_song))
        .route("/playlists/:id/songs/:song_id", delete(playlists::remove_song))
        .route("/playlists/:id/reorder", put(playlists::reorder_playlist))
        .route("/playlists/:id/shuffle", post(playlists::shuffle_playlist))
        .route("/playlists/:id/duplicate", post(playlists::duplicate_playlist))
        .route("/playlists/:id/clear", post(playlists::clear_playlist))

        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/search", get(users::search_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/subscription", put(users::update_subscription))
        .route("/users/:id/deactivate", post(users::deactivate_user))
        .route("/users/:id/reactivate", post(users::reactivate_user))
        .route("/users/:id/playlists", get(users::user_playlists))
        .route(
            "/users/:id/preferences",
            get(users::get_preferences).put(users::update_preferences),
        )

        // Current user
        .route("/me/likes", get(me::list_likes).post(me::toggle_like))
        .route("/me/likes/songs", get(me::liked_songs))
        .route("/me/likes/stats", get(me::like_stats))
        .route("/me/follows", get(me::list_follows).post(me::toggle_follow))
        .route("/me/follows/stats", get(me::follow_stats))
        .route(
            "/me/library",
            get(me::list_library)
                .post(me::toggle_library)
                .delete(me::clear_library),
        )
        .route("/me/library/stats", get(me::library_stats))
        .route("/me/library/export", get(me::export_library))
        .route("/me/history", get(me::history))
        .route("/me/stats", get(me::listening_stats))
        .route("/me/streaks", get(me::streaks))
        .route("/me/top-tracks", get(me::top_tracks))
        .route("/me/top-artists", get(me::top_artists))

        // Player session
        .route("/player", get(player::get_state))
        .route("/player/play", post(player::play))
        .route("/player/pause", post(player::pause))
        .route("/player/resume", post(player::resume))
        .route("/player/toggle", post(player::toggle_play))
        .route("/player/stop", post(player::stop))
        .route("/player/seek", post(player::seek))
        .route("/player/volume", post(player::set_volume))
        .route("/player/shuffle", post(player::toggle_shuffle))
        .route("/player/repeat", post(player::toggle_repeat))
        .route("/player/next", post(player::next))
        .route("/player/previous", post(player::previous))
        .route("/player/songs", get(player::list_songs))
        .route("/player/songs/:id/like", post(player::like_song))
        .route("/player/songs/:id/dislike", post(player::dislike_song))
        .route(
            "/player/collections",
            get(player::list_collections).post(player::create_collection),
        )
        .route("/player/collections/:id", get(player::get_collection))
        .route("/player/collections/:id/songs", post(player::add_to_collection))
        .route(
            "/player/collections/:id/songs/:song_id",
            delete(player::remove_from_collection),
        )
        .route("/player/equalizer", get(player::get_equalizer))
        .route("/player/equalizer/reset", post(player::reset_equalizer))
        .route("/player/equalizer/:band", put(player::set_band))

        // Library import
        .route("/import", post(import::import_library))
}

pub fn html_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(html::index))
        .route("/collections/:id", get(html::collection_page))
        .route("/ui/songs/:id/like", post(html::like_song))
        .route("/ui/songs/:id/dislike", post(html::dislike_song))
        .route("/ui/songs/:id/play", post(html::play_song))
        .route("/ui/collections", post(html::create_collection))
        .route("/ui/songs/:id/collections", post(html::add_to_collection))
        .route("/ui/player/toggle", post(html::toggle_play))
        .route("/ui/player/next", post(html::next))
        .route("/ui/player/previous", post(html::previous))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let request = page_request(None, None);
        assert_eq!(request, PageRequest::new(1, 10));
    }

    #[test]
    fn test_page_request_caps_limit() {
        let request = page_request(Some(3), Some(10_000));
        assert_eq!(request.page, 3);
        assert_eq!(request.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_request_zero_is_first_page() {
        let request = page_request(Some(0), Some(0));
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 1);
    }
}
