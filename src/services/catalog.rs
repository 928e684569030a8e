use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::entities::{album, artist, song};
use crate::db::repositories::{
    AlbumChanges, AlbumRepository, ArtistChanges, ArtistRepository, NewAlbum, NewArtist, NewSong,
    PlaylistRepository, SongChanges, SongRepository,
};
use crate::error::{AppError, Result};

pub const DEFAULT_RECENT_ALBUMS: u64 = 10;
pub const MAX_RECENT_ALBUMS: u64 = 50;
pub const DEFAULT_POPULAR_SONGS: u64 = 20;
pub const MAX_POPULAR_SONGS: u64 = 100;
pub const DEFAULT_POPULAR_ARTISTS: u64 = 10;
pub const MAX_POPULAR_ARTISTS: u64 = 50;
pub const DEFAULT_SEARCH_LIMIT: u64 = 20;
pub const MAX_SEARCH_LIMIT: u64 = 100;

/// Days an album counts as "recent".
const RECENT_ALBUM_DAYS: i64 = 30;

pub fn clamp_limit(requested: Option<u64>, default: u64, max: u64) -> u64 {
    requested.unwrap_or(default).clamp(1, max)
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_trimmed(field: &str, value: Option<String>) -> Result<Option<String>> {
    value.map(|v| required(field, &v)).transpose()
}

/// Input checks in front of the song, album and artist repositories.
#[derive(Clone)]
pub struct CatalogService {
    songs: SongRepository,
    albums: AlbumRepository,
    artists: ArtistRepository,
    playlists: PlaylistRepository,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            songs: SongRepository::new(db.clone()),
            albums: AlbumRepository::new(db.clone()),
            artists: ArtistRepository::new(db.clone()),
            playlists: PlaylistRepository::new(db),
        }
    }

    pub async fn create_song(&self, mut input: NewSong) -> Result<song::Model> {
        input.title = required("title", &input.title)?;
        if input.duration_seconds <= 0 {
            return Err(AppError::validation("duration_seconds", "must be greater than 0"));
        }
        if let Some(album_id) = input.album_id {
            self.albums.get(album_id).await?;
        }

        let song = self.songs.create(input).await?;
        if let Some(album_id) = song.album_id {
            self.albums.sync_stats(album_id).await?;
        }
        Ok(song)
    }

    pub async fn update_song(&self, id: Uuid, mut changes: SongChanges) -> Result<song::Model> {
        changes.title = optional_trimmed("title", changes.title)?;
        if matches!(changes.duration_seconds, Some(d) if d <= 0) {
            return Err(AppError::validation("duration_seconds", "must be greater than 0"));
        }
        let duration_changed = changes.duration_seconds.is_some();

        let song = self.songs.update_details(id, changes).await?;
        if let (true, Some(album_id)) = (duration_changed, song.album_id) {
            self.albums.sync_stats(album_id).await?;
        }
        Ok(song)
    }

    /// Delete a song after taking it out of every playlist, so positions stay
    /// contiguous. Returns the song and the playlists it was removed from.
    pub async fn delete_song(&self, id: Uuid) -> Result<(song::Model, Vec<Uuid>)> {
        self.songs.get(id).await?;
        let playlist_ids = self.playlists.detach_song(id).await?;
        let song = self.songs.delete(id).await?;
        if let Some(album_id) = song.album_id {
            self.albums.sync_stats(album_id).await?;
        }
        Ok((song, playlist_ids))
    }

    pub async fn songs_by_genre(&self, genre: &str, limit: Option<u64>) -> Result<Vec<song::Model>> {
        let genre = required("genre", genre)?;
        self.songs
            .find_by_genre(&genre, clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT))
            .await
    }

    pub async fn popular_songs(&self, limit: Option<u64>) -> Result<Vec<song::Model>> {
        self.songs
            .find_popular(clamp_limit(limit, DEFAULT_POPULAR_SONGS, MAX_POPULAR_SONGS))
            .await
    }

    pub async fn search_songs(&self, query: &str, limit: Option<u64>) -> Result<Vec<song::Model>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.songs
            .search(query, clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT))
            .await
    }

    pub async fn create_album(&self, mut input: NewAlbum) -> Result<album::Model> {
        input.title = required("title", &input.title)?;
        input.description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.albums.create(input).await
    }

    pub async fn update_album(&self, id: Uuid, mut changes: AlbumChanges) -> Result<album::Model> {
        changes.title = optional_trimmed("title", changes.title)?;
        self.albums.update(id, changes).await
    }

    pub async fn recent_albums(&self, limit: Option<u64>) -> Result<Vec<album::Model>> {
        self.albums
            .find_recent(
                RECENT_ALBUM_DAYS,
                clamp_limit(limit, DEFAULT_RECENT_ALBUMS, MAX_RECENT_ALBUMS),
            )
            .await
    }

    pub async fn search_albums(&self, query: &str, limit: Option<u64>) -> Result<Vec<album::Model>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.albums
            .search(query, clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT))
            .await
    }

    pub async fn albums_by_genre(&self, genre: &str) -> Result<Vec<album::Model>> {
        let genre = required("genre", genre)?;
        self.albums.find_by_genres(&[genre]).await
    }

    pub async fn create_artist(&self, mut input: NewArtist) -> Result<artist::Model> {
        input.name = required("name", &input.name)?;
        input.bio = input
            .bio
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        self.artists.create(input).await
    }

    pub async fn update_artist(&self, id: Uuid, mut changes: ArtistChanges) -> Result<artist::Model> {
        changes.name = optional_trimmed("name", changes.name)?;
        self.artists.update(id, changes).await
    }

    pub async fn popular_artists(&self, limit: Option<u64>) -> Result<Vec<artist::Model>> {
        self.artists
            .find_popular(clamp_limit(limit, DEFAULT_POPULAR_ARTISTS, MAX_POPULAR_ARTISTS))
            .await
    }

    pub async fn search_artists(&self, query: &str, limit: Option<u64>) -> Result<Vec<artist::Model>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.artists
            .search(query, clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, DEFAULT_RECENT_ALBUMS, MAX_RECENT_ALBUMS), 10);
        assert_eq!(clamp_limit(Some(0), DEFAULT_RECENT_ALBUMS, MAX_RECENT_ALBUMS), 1);
        assert_eq!(clamp_limit(Some(500), DEFAULT_POPULAR_SONGS, MAX_POPULAR_SONGS), 100);
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("title", "  Nocturnal Vibes ").unwrap(), "Nocturnal Vibes");
        assert!(matches!(
            required("title", "   "),
            Err(AppError::Validation { ref field, .. }) if field == "title"
        ));
        assert_eq!(optional_trimmed("title", None).unwrap(), None);
    }
}
