use maud::{html, Markup, DOCTYPE};

use super::components::{player_bar, sidebar};
use crate::player::LibrarySession;

/// Full page shell: sidebar of collections, main content, fixed player bar.
pub fn base_layout(title: &str, session: &LibrarySession, active: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" class="h-full" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - TuneStream" }

                link rel="stylesheet" href="/static/css/output.css";
                script src="https://unpkg.com/htmx.org@1.9.10" {}

                style {
                    r#"
                    .song-card:hover {
                        background-color: rgba(255,255,255,0.06);
                    }
                    .toast {
                        animation: toast-fade 3s forwards;
                    }
                    @keyframes toast-fade {
                        0%, 80% { opacity: 1; }
                        100% { opacity: 0; }
                    }
                    "#
                }
            }
            body class="h-full bg-gray-950 text-gray-100" {
                div class="flex h-full pb-24" {
                    (sidebar(session, active))

                    main class="flex-1 overflow-y-auto px-8 py-6" {
                        (content)
                    }
                }

                (player_bar(session.player()))

                div id="toast-area" class="fixed top-4 right-4 z-50" {}
            }
        }
    }
}
