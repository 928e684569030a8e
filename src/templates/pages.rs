use maud::{html, Markup};

use super::components::{collection_card, format_duration, song_card};
use super::layout::base_layout;
use crate::player::{Collection, LibrarySession};

pub fn home_page(session: &LibrarySession) -> Markup {
    base_layout(
        "Home",
        session,
        None,
        html! {
            section class="mb-10" {
                h1 class="text-3xl font-bold mb-6" { "Good to hear you" }

                @if session.collections().is_empty() {
                    p class="text-gray-400" { "No playlists yet." }
                } @else {
                    div class="grid grid-cols-2 md:grid-cols-4 gap-4" {
                        @for collection in session.collections() {
                            (collection_card(collection))
                        }
                    }
                }
            }

            section {
                h2 class="text-xl font-semibold mb-4" { "Songs" }

                @if session.songs().is_empty() {
                    div class="rounded-lg bg-gray-900 p-8 text-center text-gray-400" {
                        p { "Your catalog is empty." }
                        p class="text-sm mt-2" { "Import a music folder to get started." }
                    }
                } @else {
                    div id="song-list" class="space-y-1" {
                        @for song in session.songs() {
                            (song_card(song, session, None))
                        }
                    }
                }
            }
        },
    )
}

pub fn collection_page(session: &LibrarySession, collection: &Collection) -> Markup {
    base_layout(
        &collection.name,
        session,
        Some(collection.id.as_str()),
        html! {
            header class="mb-8" {
                p class="text-xs uppercase tracking-wide text-gray-500" {
                    @if collection.is_liked_songs() { "Collection" } @else { "Playlist" }
                }
                h1 class="text-4xl font-bold mt-1" { (collection.name) }
                @if let Some(description) = &collection.description {
                    p class="text-gray-400 mt-2" { (description) }
                }
                p class="text-sm text-gray-500 mt-2" {
                    (collection.songs.len()) " songs, " (format_duration(collection.total_duration()))
                }
            }

            @if collection.songs.is_empty() {
                p class="text-gray-400" { "Nothing here yet." }
            } @else {
                div id="song-list" class="space-y-1" {
                    @for song in &collection.songs {
                        (song_card(song, session, Some(collection.id.as_str())))
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_page_renders_empty_session() {
        let session = LibrarySession::new();
        let markup = home_page(&session).into_string();

        assert!(markup.contains("TuneStream"));
        assert!(markup.contains("Liked Songs"));
        assert!(markup.contains("Your catalog is empty."));
        assert!(markup.contains(r#"id="player-bar""#));
    }

    #[test]
    fn test_collection_page_marks_sidebar_entry() {
        let session = LibrarySession::new();
        let liked = session.collection(crate::player::LIKED_SONGS_ID).cloned();
        let liked = liked.unwrap_or_else(|| Collection::new("liked-songs", "Liked Songs", None));
        let markup = collection_page(&session, &liked).into_string();

        assert!(markup.contains("Nothing here yet."));
        assert!(markup.contains("bg-gray-800 text-white"));
    }
}
