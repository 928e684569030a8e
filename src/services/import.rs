use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use id3::{Tag, TagLike};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::db::enums::{AlbumType, ArtistRole};
use crate::db::repositories::{
    AlbumRepository, ArtistRepository, NewAlbum, NewArtist, NewSong, SongRepository,
};

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Bitrate assumed when a file carries no TLEN frame.
const FALLBACK_BITRATE_BPS: u64 = 128_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub scanned: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub track: Option<i32>,
    pub disc: Option<i32>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub duration_seconds: i32,
}

pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

/// Every `.mp3` below `root`, sorted for a stable import order.
pub fn scan_music_folder(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_mp3(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "Untitled".to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn estimated_duration(path: &Path) -> i32 {
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let seconds = bytes * 8 / FALLBACK_BITRATE_BPS;
    i32::try_from(seconds).unwrap_or(i32::MAX).max(1)
}

/// Read the ID3 tag of one file. Files without a tag import under their file name.
pub fn read_metadata(path: &Path) -> Result<TrackMetadata> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => Some(tag),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => None,
        Err(e) => return Err(e).with_context(|| format!("reading tags of {}", path.display())),
    };

    let tagged_duration = tag
        .as_ref()
        .and_then(|t| t.duration())
        .map(|ms| i32::try_from(ms / 1000).unwrap_or(i32::MAX))
        .filter(|secs| *secs > 0);

    Ok(TrackMetadata {
        path: path.to_path_buf(),
        title: tag
            .as_ref()
            .and_then(|t| non_empty(t.title()))
            .unwrap_or_else(|| file_stem(path)),
        artist: tag
            .as_ref()
            .and_then(|t| non_empty(t.artist()))
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album: tag.as_ref().and_then(|t| non_empty(t.album())),
        track: tag.as_ref().and_then(|t| t.track()).and_then(|n| i32::try_from(n).ok()),
        disc: tag.as_ref().and_then(|t| t.disc()).and_then(|n| i32::try_from(n).ok()),
        genre: tag.as_ref().and_then(|t| non_empty(t.genre())),
        year: tag.as_ref().and_then(|t| t.year()),
        duration_seconds: tagged_duration.unwrap_or_else(|| estimated_duration(path)),
    })
}

pub struct LibraryImporter {
    artists: ArtistRepository,
    albums: AlbumRepository,
    songs: SongRepository,
}

enum Outcome {
    Imported,
    Skipped,
}

impl LibraryImporter {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            artists: ArtistRepository::new(db.clone()),
            albums: AlbumRepository::new(db.clone()),
            songs: SongRepository::new(db),
        }
    }

    pub async fn import_folder(&self, root: &Path) -> Result<ImportReport> {
        tracing::info!("Starting library import from {:?}", root);

        let root = root.to_path_buf();
        let tracks = tokio::task::spawn_blocking(move || -> Result<Vec<(PathBuf, Result<TrackMetadata>)>> {
            let files = scan_music_folder(&root)?;
            Ok(files
                .into_iter()
                .map(|path| {
                    let metadata = read_metadata(&path);
                    (path, metadata)
                })
                .collect())
        })
        .await
        .context("import scan task panicked")??;

        let mut report = ImportReport {
            scanned: tracks.len(),
            ..Default::default()
        };
        let mut touched_albums = HashSet::new();

        for (path, metadata) in tracks {
            let result = match metadata {
                Ok(metadata) => self.import_track(metadata, &mut touched_albums).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(Outcome::Imported) => report.imported += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("Failed to import {}: {:#}", path.display(), e);
                    report.failed += 1;
                    report.errors.push(format!("{}: {:#}", path.display(), e));
                }
            }
        }

        for album_id in touched_albums {
            self.albums.sync_stats(album_id).await?;
        }

        tracing::info!(
            "Library import finished: {} scanned, {} imported, {} skipped, {} failed",
            report.scanned,
            report.imported,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    async fn import_track(&self, track: TrackMetadata, touched_albums: &mut HashSet<Uuid>) -> Result<Outcome> {
        let artist = match self.artists.find_by_name(&track.artist).await? {
            Some(artist) => artist,
            None => {
                self.artists
                    .create(NewArtist {
                        name: track.artist.clone(),
                        genres: track.genre.clone().into_iter().collect(),
                        ..Default::default()
                    })
                    .await?
            }
        };

        let album_id = match &track.album {
            Some(title) => Some(self.album_for(artist.id, title, &track).await?),
            None => None,
        };

        let existing = match album_id {
            Some(album_id) => self.songs.find_by_album(album_id).await?,
            None => self.songs.find_by_artist(artist.id).await?,
        };
        if existing.iter().any(|s| s.title.eq_ignore_ascii_case(&track.title)) {
            tracing::debug!("Skipping {}: already imported", track.path.display());
            return Ok(Outcome::Skipped);
        }

        let song = self
            .songs
            .create(NewSong {
                title: track.title,
                album_id,
                duration_seconds: track.duration_seconds,
                song_number: track.track,
                disc_number: track.disc,
                genres: track.genre.into_iter().collect(),
                audio_url: Some(track.path.display().to_string()),
                ..Default::default()
            })
            .await?;
        self.songs.link_artist(song.id, artist.id, ArtistRole::Primary).await?;

        if let Some(album_id) = album_id {
            touched_albums.insert(album_id);
        }
        Ok(Outcome::Imported)
    }

    async fn album_for(&self, artist_id: Uuid, title: &str, track: &TrackMetadata) -> Result<Uuid> {
        let albums = self.albums.find_by_artist(artist_id).await?;
        if let Some(album) = albums.iter().find(|a| a.title.eq_ignore_ascii_case(title)) {
            return Ok(album.id);
        }

        let album = self
            .albums
            .create(NewAlbum {
                title: title.to_string(),
                description: None,
                cover_url: None,
                release_date: track.year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
                album_type: AlbumType::Album,
                genres: track.genre.clone().into_iter().collect(),
                label: None,
            })
            .await?;
        self.albums.add_artist(album.id, artist_id, ArtistRole::Primary).await?;
        Ok(album.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_finds_only_mp3() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.mp3"), b"").unwrap();
        fs::write(dir.path().join("nested/b.MP3"), b"").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"").unwrap();

        let files = scan_music_folder(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(scan_music_folder(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_untagged_file_uses_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Ocean Waves.mp3");
        fs::write(&path, vec![0u8; 32_000]).unwrap();

        let metadata = read_metadata(&path).unwrap();
        assert_eq!(metadata.title, "Ocean Waves");
        assert_eq!(metadata.artist, UNKNOWN_ARTIST);
        assert_eq!(metadata.album, None);
        assert_eq!(metadata.duration_seconds, 2);
    }
}
