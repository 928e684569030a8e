use maud::{html, Markup};

use crate::player::{Collection, LibrarySession, PlayerState, RepeatMode, SessionSong};

/// "3:05"
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn sidebar(session: &LibrarySession, active: Option<&str>) -> Markup {
    sidebar_markup(session, active, false)
}

/// Sidebar swapped out-of-band so collection counts follow likes and additions.
pub fn sidebar_oob(session: &LibrarySession, active: Option<&str>) -> Markup {
    sidebar_markup(session, active, true)
}

fn sidebar_markup(session: &LibrarySession, active: Option<&str>, oob: bool) -> Markup {
    html! {
        nav id="sidebar"
            hx-swap-oob=[oob.then_some("true")]
            class="w-64 shrink-0 bg-black px-4 py-6 overflow-y-auto" {

            a href="/" class="flex items-center space-x-3 mb-8" {
                span class="text-2xl" { "🎧" }
                span class="text-xl font-bold" { "TuneStream" }
            }

            h2 class="text-xs uppercase tracking-wide text-gray-500 mb-3" { "Your Library" }
            ul class="space-y-1" {
                @for collection in session.collections() {
                    @let selected = active == Some(collection.id.as_str());
                    li {
                        a href={ "/collections/" (collection.id) }
                          class={ "flex justify-between rounded-md px-3 py-2 text-sm "
                                  (if selected { "bg-gray-800 text-white" } else { "text-gray-300 hover:text-white" }) } {
                            span class="truncate" { (collection.name) }
                            span class="text-gray-500" { (collection.songs.len()) }
                        }
                    }
                }
            }

            form class="mt-6 space-y-2"
                hx-post="/ui/collections"
                hx-swap="none" {
                input type="text" name="name" placeholder="New playlist"
                    class="w-full rounded-md bg-gray-900 px-3 py-2 text-sm";
                input type="text" name="description" placeholder="Description (optional)"
                    class="w-full rounded-md bg-gray-900 px-3 py-2 text-sm";
                button type="submit"
                    class="w-full rounded-md bg-green-600 hover:bg-green-500 px-3 py-2 text-sm font-semibold" {
                    "Create playlist"
                }
            }
        }
    }
}

pub fn song_card(song: &SessionSong, session: &LibrarySession, collection_id: Option<&str>) -> Markup {
    let playing = session.player().is_current(song.id);

    html! {
        div id={ "song-" (song.id) }
            hx-vals=[collection_id.map(|id| format!(r#"{{"collection_id": "{}"}}"#, id))]
            class={ "song-card flex items-center gap-4 rounded-md px-3 py-2 "
                    (if playing { "text-green-400" } else { "" }) } {

            button class="w-8 text-lg"
                title="Play"
                hx-post={ "/ui/songs/" (song.id) "/play" }
                hx-target="#player-bar"
                hx-swap="outerHTML" {
                @if playing && session.player().is_playing { "♫" } @else { "▶" }
            }

            div class="flex-1 min-w-0" {
                p class="font-medium truncate" title=(song.title) { (song.title) }
                p class="text-sm text-gray-400 truncate" {
                    (song.artist)
                    @if let Some(album) = &song.album {
                        " · " (album)
                    }
                }
            }

            span class="text-sm text-gray-400 w-12 text-right" { (format_duration(song.duration)) }

            button class={ "text-sm " (if song.liked { "text-green-400" } else { "text-gray-400" }) }
                title="Like"
                hx-post={ "/ui/songs/" (song.id) "/like" }
                hx-target={ "#song-" (song.id) }
                hx-swap="outerHTML" {
                "👍 " (song.likes)
            }
            button class={ "text-sm " (if song.disliked { "text-red-400" } else { "text-gray-400" }) }
                title="Dislike"
                hx-post={ "/ui/songs/" (song.id) "/dislike" }
                hx-target={ "#song-" (song.id) }
                hx-swap="outerHTML" {
                "👎 " (song.dislikes)
            }

            form class="flex items-center gap-1"
                hx-post={ "/ui/songs/" (song.id) "/collections" }
                hx-swap="none" {
                select name="collection_id" class="rounded bg-gray-900 px-2 py-1 text-xs" {
                    @for collection in session.playlists() {
                        option value=(collection.id) { (collection.name) }
                    }
                }
                button type="submit" class="text-xs text-gray-300 hover:text-white" { "＋" }
            }
        }
    }
}

pub fn collection_card(collection: &Collection) -> Markup {
    html! {
        a href={ "/collections/" (collection.id) }
          class="block rounded-lg bg-gray-900 hover:bg-gray-800 p-4 transition" {
            h3 class="font-semibold truncate" title=(collection.name) { (collection.name) }
            @if let Some(description) = &collection.description {
                p class="text-sm text-gray-400 truncate" { (description) }
            }
            p class="text-xs text-gray-500 mt-2" {
                (collection.songs.len()) " songs · " (format_duration(collection.total_duration()))
            }
        }
    }
}

pub fn player_bar(player: &PlayerState) -> Markup {
    let repeat = match player.repeat {
        RepeatMode::None => "Repeat off",
        RepeatMode::All => "Repeat all",
        RepeatMode::One => "Repeat one",
    };

    html! {
        footer id="player-bar"
            class="fixed bottom-0 inset-x-0 h-24 bg-gray-900 border-t border-gray-800 px-6 flex items-center gap-6" {

            div class="w-1/3 min-w-0" {
                @if let Some(song) = &player.current_song {
                    p class="font-medium truncate" { (song.title) }
                    p class="text-sm text-gray-400 truncate" { (song.artist) }
                } @else {
                    p class="text-sm text-gray-500" { "Nothing playing" }
                }
            }

            div class="flex-1 flex flex-col items-center" {
                div class="flex items-center gap-4" {
                    button hx-post="/ui/player/previous" hx-target="#player-bar" hx-swap="outerHTML" { "⏮" }
                    button class="rounded-full bg-white text-black w-10 h-10"
                        hx-post="/ui/player/toggle" hx-target="#player-bar" hx-swap="outerHTML" {
                        @if player.is_playing { "⏸" } @else { "▶" }
                    }
                    button hx-post="/ui/player/next" hx-target="#player-bar" hx-swap="outerHTML" { "⏭" }
                }
                p class="text-xs text-gray-400 mt-1" {
                    (format_duration(player.current_time)) " / " (format_duration(player.duration))
                }
            }

            div class="w-1/3 flex justify-end gap-4 text-xs text-gray-400" {
                span class=(if player.shuffle { "text-green-400" } else { "" }) { "Shuffle" }
                span class=(if player.repeat != RepeatMode::None { "text-green-400" } else { "" }) { (repeat) }
                span { "Vol " (player.volume) }
            }
        }
    }
}

/// Out-of-band toast; replaces whatever is in the toast area.
pub fn toast(message: &str) -> Markup {
    html! {
        div id="toast-area" hx-swap-oob="true" class="fixed top-4 right-4 z-50" {
            div class="toast rounded-md bg-green-600 px-4 py-2 text-sm font-medium shadow-lg" {
                (message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(245), "4:05");
    }

    #[test]
    fn test_toast_is_out_of_band() {
        let markup = toast("Added to Road Trip").into_string();
        assert!(markup.contains(r#"hx-swap-oob="true""#));
        assert!(markup.contains("Added to Road Trip"));
    }

    #[test]
    fn test_empty_player_bar() {
        let markup = player_bar(&PlayerState::default()).into_string();
        assert!(markup.contains("Nothing playing"));
        assert!(markup.contains("Vol 75"));
    }
}
