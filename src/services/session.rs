use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::entities::{album, artist, playlist, song};
use crate::db::enums::ArtistRole;
use crate::db::repositories::{DbResultExt, PageRequest, PlaylistRepository, SongRepository};
use crate::error::Result;
use crate::player::{Collection, LibrarySession, SessionSong};

/// Songs pulled into a fresh session, most played first.
const SESSION_SONG_LIMIT: u64 = 200;
const SESSION_PLAYLIST_LIMIT: u64 = 50;

/// Attach the primary artist name and album title to each song.
pub async fn to_session_songs(db: &DatabaseConnection, songs: Vec<song::Model>) -> Result<Vec<SessionSong>> {
    let ids: Vec<Uuid> = songs.iter().map(|s| s.id).collect();
    let links = SongRepository::new(db.clone()).artist_links(&ids).await?;

    let artist_ids: Vec<Uuid> = links.iter().map(|l| l.artist_id).collect();
    let album_ids: Vec<Uuid> = songs.iter().filter_map(|s| s.album_id).collect();

    let (artists, albums) = tokio::try_join!(
        async {
            artist::Entity::find()
                .filter(artist::Column::Id.is_in(artist_ids))
                .all(db)
                .await
                .for_entity("Artist")
        },
        async {
            album::Entity::find()
                .filter(album::Column::Id.is_in(album_ids))
                .all(db)
                .await
                .for_entity("Album")
        },
    )?;

    let artist_names: HashMap<Uuid, String> = artists.into_iter().map(|a| (a.id, a.name)).collect();
    let album_titles: HashMap<Uuid, String> = albums.into_iter().map(|a| (a.id, a.title)).collect();

    let mut primary: HashMap<Uuid, String> = HashMap::new();
    for link in &links {
        if let Some(name) = artist_names.get(&link.artist_id) {
            let slot = primary.entry(link.song_id).or_insert_with(|| name.clone());
            if link.role == ArtistRole::Primary {
                *slot = name.clone();
            }
        }
    }

    Ok(songs
        .into_iter()
        .map(|song| {
            let artist = primary
                .get(&song.id)
                .cloned()
                .unwrap_or_else(|| "Unknown Artist".to_string());
            let album = song.album_id.and_then(|id| album_titles.get(&id).cloned());
            SessionSong::from_model(song, artist, album)
        })
        .collect())
}

/// A playlist and its songs, in playlist order, as a session collection.
pub async fn playlist_collection(db: &DatabaseConnection, playlist: playlist::Model) -> Result<Collection> {
    let entries = PlaylistRepository::new(db.clone()).songs(playlist.id).await?;
    let songs = to_session_songs(db, entries.into_iter().map(|(_, song)| song).collect()).await?;

    Ok(Collection {
        id: playlist.id.to_string(),
        name: playlist.name,
        description: playlist.description,
        songs,
        is_public: playlist.is_public,
        created_at: playlist.created_at.with_timezone(&Utc),
    })
}

/// Mirror a stored playlist into the session after it changed. Private or deleted
/// playlists drop out of the session.
pub async fn refresh_playlist(
    db: &DatabaseConnection,
    session: &RwLock<LibrarySession>,
    playlist_id: Uuid,
) -> Result<()> {
    let key = playlist_id.to_string();
    match PlaylistRepository::new(db.clone()).find_by_id(playlist_id).await? {
        Some(playlist) if playlist.is_public => {
            let collection = playlist_collection(db, playlist).await?;
            let mut session = session.write().await;
            session.load_songs(collection.songs.iter().cloned());
            session.insert_collection(collection);
        }
        _ => {
            session.write().await.remove_collection(&key);
        }
    }
    Ok(())
}

/// Build the listening session from the catalog and the public playlists.
pub async fn load_session(db: &DatabaseConnection) -> Result<LibrarySession> {
    let mut session = LibrarySession::new();

    let songs = SongRepository::new(db.clone()).find_popular(SESSION_SONG_LIMIT).await?;
    session.load_songs(to_session_songs(db, songs).await?);

    let playlists = PlaylistRepository::new(db.clone());
    let page = playlists
        .find_public(PageRequest::new(1, SESSION_PLAYLIST_LIMIT))
        .await?;
    for playlist in page.data {
        let collection = playlist_collection(db, playlist).await?;
        session.load_songs(collection.songs.iter().cloned());
        session.insert_collection(collection);
    }

    tracing::info!(
        "Loaded session with {} songs and {} collections",
        session.songs().len(),
        session.collections().len()
    );
    Ok(session)
}
