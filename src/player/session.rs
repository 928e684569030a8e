use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use uuid::Uuid;

use super::equalizer::EqualizerSettings;
use super::state::{PlayerState, RepeatMode};
use super::SessionError;
use crate::db::entities::song;

pub const LIKED_SONGS_ID: &str = "liked-songs";
const LIKED_SONGS_NAME: &str = "Liked Songs";

/// A song as the page sees it, including this listener's reaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSong {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration: u32,
    pub genres: Vec<String>,
    pub play_count: i64,
    pub liked: bool,
    pub disliked: bool,
    pub likes: i64,
    pub dislikes: i64,
}

impl SessionSong {
    pub fn from_model(model: song::Model, artist: impl Into<String>, album: Option<String>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            artist: artist.into(),
            album,
            duration: u32::try_from(model.duration_seconds).unwrap_or(0),
            genres: model.genres.0,
            play_count: model.play_count,
            liked: false,
            disliked: false,
            likes: model.like_count,
            dislikes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub songs: Vec<SessionSong>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            songs: Vec::new(),
            is_public: false,
            created_at: Utc::now(),
        }
    }

    pub fn contains(&self, song_id: Uuid) -> bool {
        self.songs.iter().any(|s| s.id == song_id)
    }

    pub fn is_liked_songs(&self) -> bool {
        self.id == LIKED_SONGS_ID
    }

    pub fn total_duration(&self) -> u32 {
        self.songs.iter().map(|s| s.duration).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

impl AddOutcome {
    pub fn toast(&self, collection: &str) -> String {
        match self {
            Self::Added => format!("Added to {}", collection),
            Self::AlreadyPresent => format!("Already in {}", collection),
        }
    }
}

/// Everything the listening page holds between requests.
#[derive(Debug, Clone, Serialize)]
pub struct LibrarySession {
    songs: Vec<SessionSong>,
    collections: Vec<Collection>,
    player: PlayerState,
    equalizer: EqualizerSettings,
    queue_collection: Option<String>,
}

impl Default for LibrarySession {
    fn default() -> Self {
        Self::new()
    }
}

impl LibrarySession {
    pub fn new() -> Self {
        Self {
            songs: Vec::new(),
            collections: vec![Collection::new(
                LIKED_SONGS_ID,
                LIKED_SONGS_NAME,
                Some("Your favorite tracks".to_string()),
            )],
            player: PlayerState::default(),
            equalizer: EqualizerSettings::default(),
            queue_collection: None,
        }
    }

    pub fn songs(&self) -> &[SessionSong] {
        &self.songs
    }

    pub fn song(&self, song_id: Uuid) -> Option<&SessionSong> {
        self.songs.iter().find(|s| s.id == song_id)
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Collections a song can be added to (everything but "Liked Songs").
    pub fn playlists(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter().filter(|c| !c.is_liked_songs())
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn liked_songs(&self) -> &[SessionSong] {
        self.collection(LIKED_SONGS_ID)
            .map(|c| c.songs.as_slice())
            .unwrap_or_default()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn equalizer(&self) -> &EqualizerSettings {
        &self.equalizer
    }

    pub fn equalizer_mut(&mut self) -> &mut EqualizerSettings {
        &mut self.equalizer
    }

    /// Insert new songs and refresh catalog fields of known ones, keeping reactions.
    pub fn load_songs(&mut self, songs: impl IntoIterator<Item = SessionSong>) {
        for incoming in songs {
            match self.songs.iter_mut().find(|s| s.id == incoming.id) {
                Some(existing) => {
                    let (liked, disliked, dislikes) =
                        (existing.liked, existing.disliked, existing.dislikes);
                    *existing = SessionSong {
                        liked,
                        disliked,
                        dislikes,
                        ..incoming
                    };
                }
                None => self.songs.push(incoming),
            }
        }
    }

    /// Add a collection loaded from storage. An existing collection with the same id is replaced.
    pub fn insert_collection(&mut self, collection: Collection) {
        match self.collections.iter_mut().find(|c| c.id == collection.id) {
            Some(existing) => *existing = collection,
            None => self.collections.push(collection),
        }
    }

    /// Drop a collection. "Liked Songs" cannot be removed.
    pub fn remove_collection(&mut self, id: &str) -> bool {
        if id == LIKED_SONGS_ID {
            return false;
        }
        let before = self.collections.len();
        self.collections.retain(|c| c.id != id);
        if self.queue_collection.as_deref() == Some(id) {
            self.queue_collection = None;
        }
        self.collections.len() != before
    }

    pub fn create_collection(
        &mut self,
        name: &str,
        description: Option<String>,
    ) -> Result<&Collection, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let description = description.filter(|d| !d.trim().is_empty());
        self.collections
            .push(Collection::new(Uuid::new_v4().to_string(), name, description));
        tracing::debug!("Created collection {}", name);
        Ok(&self.collections[self.collections.len() - 1])
    }

    pub fn add_to_collection(
        &mut self,
        collection_id: &str,
        song_id: Uuid,
    ) -> Result<(AddOutcome, String), SessionError> {
        let song = self
            .song(song_id)
            .cloned()
            .ok_or(SessionError::UnknownSong(song_id))?;
        let collection = self
            .collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| SessionError::UnknownCollection(collection_id.to_string()))?;

        if collection.contains(song_id) {
            return Ok((AddOutcome::AlreadyPresent, collection.name.clone()));
        }
        collection.songs.push(song);
        Ok((AddOutcome::Added, collection.name.clone()))
    }

    pub fn remove_from_collection(&mut self, collection_id: &str, song_id: Uuid) -> Result<bool, SessionError> {
        let collection = self
            .collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| SessionError::UnknownCollection(collection_id.to_string()))?;
        let before = collection.songs.len();
        collection.songs.retain(|s| s.id != song_id);
        Ok(collection.songs.len() != before)
    }

    /// Forget a song that left the catalog. Playback stops if it was the current song.
    pub fn remove_song(&mut self, song_id: Uuid) -> bool {
        let before = self.songs.len();
        self.songs.retain(|s| s.id != song_id);
        for collection in &mut self.collections {
            collection.songs.retain(|s| s.id != song_id);
        }
        if self.player.is_current(song_id) {
            self.player.stop();
            self.player.current_song = None;
            self.player.duration = 0;
        }
        self.songs.len() != before
    }

    /// Toggle a like. Liking clears a dislike.
    pub fn like(&mut self, song_id: Uuid) -> Result<SessionSong, SessionError> {
        let song = self
            .songs
            .iter_mut()
            .find(|s| s.id == song_id)
            .ok_or(SessionError::UnknownSong(song_id))?;

        let was_liked = song.liked;
        if song.disliked {
            song.dislikes = (song.dislikes - 1).max(0);
        }
        song.liked = !was_liked;
        song.disliked = false;
        song.likes = if was_liked { (song.likes - 1).max(0) } else { song.likes + 1 };

        let updated = song.clone();
        self.propagate(&updated);
        if updated.liked {
            self.push_liked(&updated);
        } else {
            self.drop_liked(song_id);
        }
        Ok(updated)
    }

    /// Toggle a dislike. Disliking clears a like and drops the song from "Liked Songs".
    pub fn dislike(&mut self, song_id: Uuid) -> Result<SessionSong, SessionError> {
        let song = self
            .songs
            .iter_mut()
            .find(|s| s.id == song_id)
            .ok_or(SessionError::UnknownSong(song_id))?;

        let was_disliked = song.disliked;
        if song.liked {
            song.likes = (song.likes - 1).max(0);
        }
        song.disliked = !was_disliked;
        song.liked = false;
        song.dislikes = if was_disliked {
            (song.dislikes - 1).max(0)
        } else {
            song.dislikes + 1
        };

        let updated = song.clone();
        self.propagate(&updated);
        self.drop_liked(song_id);
        Ok(updated)
    }

    fn propagate(&mut self, updated: &SessionSong) {
        for collection in &mut self.collections {
            for song in collection.songs.iter_mut().filter(|s| s.id == updated.id) {
                *song = updated.clone();
            }
        }
        if self.player.is_current(updated.id) {
            self.player.current_song = Some(updated.clone());
        }
    }

    fn push_liked(&mut self, song: &SessionSong) {
        if let Some(liked) = self.collections.iter_mut().find(|c| c.is_liked_songs()) {
            if !liked.contains(song.id) {
                liked.songs.push(song.clone());
            }
        }
    }

    fn drop_liked(&mut self, song_id: Uuid) {
        if let Some(liked) = self.collections.iter_mut().find(|c| c.is_liked_songs()) {
            liked.songs.retain(|s| s.id != song_id);
        }
    }

    /// Play a song, optionally queueing the rest of a collection after it.
    pub fn play_song(&mut self, song_id: Uuid, collection_id: Option<&str>) -> Result<&PlayerState, SessionError> {
        if let Some(id) = collection_id {
            let collection = self
                .collection(id)
                .ok_or_else(|| SessionError::UnknownCollection(id.to_string()))?;
            if !collection.contains(song_id) {
                return Err(SessionError::UnknownSong(song_id));
            }
        }
        let song = self
            .song(song_id)
            .cloned()
            .ok_or(SessionError::UnknownSong(song_id))?;

        self.queue_collection = collection_id.map(str::to_string);
        self.player.play(song);
        Ok(&self.player)
    }

    fn queue(&self) -> Vec<Uuid> {
        let songs = self
            .queue_collection
            .as_deref()
            .and_then(|id| self.collection(id))
            .map(|c| c.songs.as_slice())
            .unwrap_or(self.songs.as_slice());
        songs.iter().map(|s| s.id).collect()
    }

    fn start(&mut self, song_id: Uuid) -> Option<&SessionSong> {
        let song = self.song(song_id).cloned()?;
        self.player.play(song);
        self.player.restart();
        self.player.current_song.as_ref()
    }

    /// Advance the queue. Returns the song now playing, or `None` when playback stopped.
    pub fn next(&mut self) -> Option<&SessionSong> {
        let queue = self.queue();
        let current = self.player.current_song.as_ref().map(|s| s.id);

        let Some(current) = current else {
            return match queue.first() {
                Some(id) => self.start(*id),
                None => None,
            };
        };

        if self.player.repeat == RepeatMode::One {
            return self.start(current);
        }

        if self.player.shuffle && queue.len() > 1 {
            let others: Vec<Uuid> = queue.iter().copied().filter(|id| *id != current).collect();
            return match others.choose(&mut rand::thread_rng()) {
                Some(id) => self.start(*id),
                None => None,
            };
        }

        let index = queue.iter().position(|id| *id == current);
        let next = match index {
            Some(i) if i + 1 < queue.len() => Some(queue[i + 1]),
            Some(_) if self.player.repeat == RepeatMode::All => queue.first().copied(),
            Some(_) => None,
            None => queue.first().copied(),
        };

        match next {
            Some(id) => self.start(id),
            None => {
                self.player.stop();
                None
            }
        }
    }

    /// Step back in the queue. At the start the current song restarts, unless repeat-all wraps.
    pub fn previous(&mut self) -> Option<&SessionSong> {
        let queue = self.queue();
        let current = self.player.current_song.as_ref().map(|s| s.id)?;

        if self.player.repeat == RepeatMode::One {
            return self.start(current);
        }

        let index = queue.iter().position(|id| *id == current);
        let previous = match index {
            Some(0) if self.player.repeat == RepeatMode::All => queue.last().copied(),
            Some(0) | None => Some(current),
            Some(i) => Some(queue[i - 1]),
        };
        match previous {
            Some(id) => self.start(id),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn song(title: &str, likes: i64, dislikes: i64) -> SessionSong {
        SessionSong {
            id: Uuid::new_v4(),
            title: title.to_string(),
            artist: "Luna Eclipse".to_string(),
            album: Some("Nocturnal Vibes".to_string()),
            duration: 245,
            genres: vec!["Electronic".to_string()],
            play_count: 0,
            liked: false,
            disliked: false,
            likes,
            dislikes,
        }
    }

    fn session_with(songs: &[SessionSong]) -> LibrarySession {
        let mut session = LibrarySession::new();
        session.load_songs(songs.iter().cloned());
        session
    }

    #[test]
    fn test_like_adds_to_liked_songs_and_counts() {
        let a = song("Midnight Dreams", 45, 2);
        let mut session = session_with(&[a.clone()]);

        let liked = session.like(a.id).unwrap();
        assert!(liked.liked);
        assert_eq!(liked.likes, 46);
        assert_eq!(session.liked_songs().len(), 1);

        let unliked = session.like(a.id).unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.likes, 45);
        assert!(session.liked_songs().is_empty());
    }

    #[test]
    fn test_like_and_dislike_are_exclusive() {
        let a = song("Electric Pulse", 78, 5);
        let mut session = session_with(&[a.clone()]);

        session.like(a.id).unwrap();
        let disliked = session.dislike(a.id).unwrap();
        assert!(disliked.disliked);
        assert!(!disliked.liked);
        assert_eq!(disliked.likes, 78);
        assert_eq!(disliked.dislikes, 6);
        assert!(session.liked_songs().is_empty());

        let liked = session.like(a.id).unwrap();
        assert!(liked.liked);
        assert!(!liked.disliked);
        assert_eq!(liked.dislikes, 5);
        assert_eq!(liked.likes, 79);
    }

    #[test]
    fn test_reaction_propagates_into_collections() {
        let a = song("Ocean Waves", 0, 0);
        let mut session = session_with(&[a.clone()]);
        let id = session.create_collection("Chill Vibes", None).unwrap().id.clone();
        session.add_to_collection(&id, a.id).unwrap();

        session.like(a.id).unwrap();
        let copy = &session.collection(&id).unwrap().songs[0];
        assert!(copy.liked);
        assert_eq!(copy.likes, 1);
    }

    #[test]
    fn test_add_to_collection_is_idempotent() {
        let a = song("Ocean Waves", 0, 0);
        let mut session = session_with(&[a.clone()]);
        let id = session.create_collection("Chill Vibes", Some("Perfect for relaxing".into())).unwrap().id.clone();

        let (first, name) = session.add_to_collection(&id, a.id).unwrap();
        assert_eq!(first.toast(&name), "Added to Chill Vibes");
        let (second, name) = session.add_to_collection(&id, a.id).unwrap();
        assert_eq!(second.toast(&name), "Already in Chill Vibes");
        assert_eq!(session.collection(&id).unwrap().songs.len(), 1);
    }

    #[test]
    fn test_unknown_ids() {
        let mut session = LibrarySession::new();
        let missing = Uuid::new_v4();
        assert!(matches!(session.like(missing), Err(SessionError::UnknownSong(_))));
        assert!(matches!(
            session.add_to_collection("nope", missing),
            Err(SessionError::UnknownSong(_))
        ));
        assert!(matches!(session.create_collection("  ", None), Err(SessionError::EmptyName)));
    }

    #[test]
    fn test_next_and_previous_follow_queue() {
        let songs = [song("One", 0, 0), song("Two", 0, 0), song("Three", 0, 0)];
        let mut session = session_with(&songs);

        session.play_song(songs[0].id, None).unwrap();
        assert_eq!(session.next().map(|s| s.id), Some(songs[1].id));
        assert_eq!(session.next().map(|s| s.id), Some(songs[2].id));
        assert_eq!(session.next(), None);
        assert!(!session.player().is_playing);

        session.play_song(songs[2].id, None).unwrap();
        session.player_mut().toggle_repeat();
        assert_eq!(session.next().map(|s| s.id), Some(songs[0].id));
        assert_eq!(session.previous().map(|s| s.id), Some(songs[2].id));

        session.player_mut().toggle_repeat();
        assert_eq!(session.next().map(|s| s.id), Some(songs[2].id));
    }

    #[test]
    fn test_shuffle_never_repeats_current() {
        let songs = [song("One", 0, 0), song("Two", 0, 0), song("Three", 0, 0)];
        let mut session = session_with(&songs);
        session.play_song(songs[0].id, None).unwrap();
        session.player_mut().toggle_shuffle();

        for _ in 0..20 {
            let before = session.player().current_song.as_ref().map(|s| s.id);
            let after = session.next().map(|s| s.id);
            assert_ne!(before, after);
        }
    }

    #[test]
    fn test_collection_queue() {
        let songs = [song("One", 0, 0), song("Two", 0, 0), song("Three", 0, 0)];
        let mut session = session_with(&songs);
        let id = session.create_collection("Mix", None).unwrap().id.clone();
        session.add_to_collection(&id, songs[2].id).unwrap();
        session.add_to_collection(&id, songs[0].id).unwrap();

        session.play_song(songs[2].id, Some(&id)).unwrap();
        assert_eq!(session.next().map(|s| s.id), Some(songs[0].id));
        assert!(session.play_song(songs[1].id, Some(&id)).is_err());
    }

    #[test]
    fn test_remove_song_clears_collections_and_player() {
        let songs = [song("One", 0, 0), song("Two", 0, 0)];
        let mut session = session_with(&songs);
        let id = session.create_collection("Mix", None).unwrap().id.clone();
        session.add_to_collection(&id, songs[0].id).unwrap();
        session.like(songs[0].id).unwrap();
        session.play_song(songs[0].id, None).unwrap();

        assert!(session.remove_song(songs[0].id));
        assert!(session.song(songs[0].id).is_none());
        assert!(session.collection(&id).unwrap().songs.is_empty());
        assert!(session.liked_songs().is_empty());
        assert!(session.player().current_song.is_none());
        assert!(!session.player().is_playing);
        assert!(!session.remove_song(songs[0].id));
    }
}
