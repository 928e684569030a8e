//! Maud markup for the listening page and its HTMX partials.

pub mod components;
pub mod layout;
pub mod pages;

pub use components::{collection_card, player_bar, sidebar_oob, song_card, toast};
pub use layout::base_layout;
pub use pages::{collection_page, home_page};
