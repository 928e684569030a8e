use serde::{Deserialize, Serialize};

use super::session::SessionSong;

pub const DEFAULT_VOLUME: u8 = 75;
pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    None,
    All,
    One,
}

impl RepeatMode {
    /// none -> all -> one -> none
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::All => Self::One,
            Self::One => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    pub current_song: Option<SessionSong>,
    pub is_playing: bool,
    pub volume: u8,
    pub current_time: u32,
    pub duration: u32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_song: None,
            is_playing: false,
            volume: DEFAULT_VOLUME,
            current_time: 0,
            duration: 0,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

impl PlayerState {
    pub fn play(&mut self, song: SessionSong) {
        let changed = self.current_song.as_ref().map(|s| s.id) != Some(song.id);
        if changed {
            self.current_time = 0;
        }
        self.duration = song.duration;
        self.current_song = Some(song);
        self.is_playing = true;
    }

    /// Start the current song over.
    pub fn restart(&mut self) {
        self.current_time = 0;
        self.is_playing = self.current_song.is_some();
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    pub fn resume(&mut self) {
        self.is_playing = self.current_song.is_some();
    }

    pub fn stop(&mut self) {
        self.is_playing = false;
        self.current_time = 0;
    }

    pub fn toggle_play(&mut self) -> bool {
        if self.is_playing {
            self.pause();
        } else {
            self.resume();
        }
        self.is_playing
    }

    pub fn seek(&mut self, seconds: i64) -> u32 {
        self.current_time = seconds.clamp(0, i64::from(self.duration)) as u32;
        self.current_time
    }

    pub fn set_volume(&mut self, volume: i64) -> u8 {
        self.volume = volume.clamp(0, i64::from(MAX_VOLUME)) as u8;
        self.volume
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    pub fn is_current(&self, song_id: uuid::Uuid) -> bool {
        self.current_song.as_ref().is_some_and(|s| s.id == song_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn song(duration: u32) -> SessionSong {
        SessionSong {
            id: Uuid::new_v4(),
            title: "Midnight Dreams".into(),
            artist: "Luna Eclipse".into(),
            album: None,
            duration,
            genres: vec![],
            play_count: 0,
            liked: false,
            disliked: false,
            likes: 0,
            dislikes: 0,
        }
    }

    #[test]
    fn test_defaults() {
        let state = PlayerState::default();
        assert_eq!(state.volume, 75);
        assert_eq!(state.repeat, RepeatMode::None);
        assert!(!state.is_playing);
    }

    #[test]
    fn test_repeat_cycle() {
        let mut state = PlayerState::default();
        assert_eq!(state.toggle_repeat(), RepeatMode::All);
        assert_eq!(state.toggle_repeat(), RepeatMode::One);
        assert_eq!(state.toggle_repeat(), RepeatMode::None);
    }

    #[test]
    fn test_clamps() {
        let mut state = PlayerState::default();
        state.play(song(245));
        assert_eq!(state.seek(500), 245);
        assert_eq!(state.seek(-3), 0);
        assert_eq!(state.set_volume(140), 100);
        assert_eq!(state.set_volume(-1), 0);
    }

    #[test]
    fn test_play_resets_time_only_on_song_change() {
        let mut state = PlayerState::default();
        let first = song(200);
        state.play(first.clone());
        state.seek(50);
        state.play(first);
        assert_eq!(state.current_time, 50);

        state.play(song(100));
        assert_eq!(state.current_time, 0);
        assert_eq!(state.duration, 100);
    }

    #[test]
    fn test_resume_without_song_stays_paused() {
        let mut state = PlayerState::default();
        assert!(!state.toggle_play());
    }
}
