use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum AlbumType {
    #[sea_orm(string_value = "album")]
    Album,
    #[sea_orm(string_value = "single")]
    Single,
    #[sea_orm(string_value = "ep")]
    Ep,
    #[sea_orm(string_value = "compilation")]
    Compilation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "premium")]
    Premium,
    #[sea_orm(string_value = "family")]
    Family,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ArtistRole {
    #[sea_orm(string_value = "primary")]
    Primary,
    #[sea_orm(string_value = "featured")]
    Featured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LikeableType {
    #[sea_orm(string_value = "song")]
    Song,
    #[sea_orm(string_value = "album")]
    Album,
    #[sea_orm(string_value = "playlist")]
    Playlist,
    #[sea_orm(string_value = "artist")]
    Artist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum FollowableType {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "artist")]
    Artist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LibraryItemType {
    #[sea_orm(string_value = "song")]
    Song,
    #[sea_orm(string_value = "album")]
    Album,
    #[sea_orm(string_value = "playlist")]
    Playlist,
    #[sea_orm(string_value = "artist")]
    Artist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum AudioQuality {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "lossless")]
    Lossless,
}

/// Parses the lowercase string form, rejecting anything outside the set with a
/// validation error on `field`.
macro_rules! parse_with_field {
    ($ty:ty, $field:literal, { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($variant),)+
                    other => Err(AppError::validation(
                        $field,
                        format!(
                            "'{}' is not one of {}",
                            other,
                            [$($text),+].join(", ")
                        ),
                    )),
                }
            }
        }
    };
}

parse_with_field!(AlbumType, "album_type", {
    "album" => AlbumType::Album,
    "single" => AlbumType::Single,
    "ep" => AlbumType::Ep,
    "compilation" => AlbumType::Compilation,
});

parse_with_field!(SubscriptionTier, "subscription_tier", {
    "free" => SubscriptionTier::Free,
    "premium" => SubscriptionTier::Premium,
    "family" => SubscriptionTier::Family,
});

parse_with_field!(ArtistRole, "role", {
    "primary" => ArtistRole::Primary,
    "featured" => ArtistRole::Featured,
});

parse_with_field!(LikeableType, "likeable_type", {
    "song" => LikeableType::Song,
    "album" => LikeableType::Album,
    "playlist" => LikeableType::Playlist,
    "artist" => LikeableType::Artist,
});

parse_with_field!(FollowableType, "followable_type", {
    "user" => FollowableType::User,
    "artist" => FollowableType::Artist,
});

parse_with_field!(LibraryItemType, "item_type", {
    "song" => LibraryItemType::Song,
    "album" => LibraryItemType::Album,
    "playlist" => LibraryItemType::Playlist,
    "artist" => LibraryItemType::Artist,
});

parse_with_field!(AudioQuality, "audio_quality", {
    "low" => AudioQuality::Low,
    "normal" => AudioQuality::Normal,
    "high" => AudioQuality::High,
    "lossless" => AudioQuality::Lossless,
});

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LikeTarget {
    Song(Uuid),
    Album(Uuid),
    Playlist(Uuid),
    Artist(Uuid),
}

impl LikeTarget {
    pub fn new(kind: LikeableType, id: Uuid) -> Self {
        match kind {
            LikeableType::Song => Self::Song(id),
            LikeableType::Album => Self::Album(id),
            LikeableType::Playlist => Self::Playlist(id),
            LikeableType::Artist => Self::Artist(id),
        }
    }

    pub fn kind(&self) -> LikeableType {
        match self {
            Self::Song(_) => LikeableType::Song,
            Self::Album(_) => LikeableType::Album,
            Self::Playlist(_) => LikeableType::Playlist,
            Self::Artist(_) => LikeableType::Artist,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Self::Song(id) | Self::Album(id) | Self::Playlist(id) | Self::Artist(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum FollowTarget {
    User(Uuid),
    Artist(Uuid),
}

impl FollowTarget {
    pub fn new(kind: FollowableType, id: Uuid) -> Self {
        match kind {
            FollowableType::User => Self::User(id),
            FollowableType::Artist => Self::Artist(id),
        }
    }

    pub fn kind(&self) -> FollowableType {
        match self {
            Self::User(_) => FollowableType::User,
            Self::Artist(_) => FollowableType::Artist,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Self::User(id) | Self::Artist(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LibraryItem {
    Song(Uuid),
    Album(Uuid),
    Playlist(Uuid),
    Artist(Uuid),
}

impl LibraryItem {
    pub fn new(kind: LibraryItemType, id: Uuid) -> Self {
        match kind {
            LibraryItemType::Song => Self::Song(id),
            LibraryItemType::Album => Self::Album(id),
            LibraryItemType::Playlist => Self::Playlist(id),
            LibraryItemType::Artist => Self::Artist(id),
        }
    }

    pub fn kind(&self) -> LibraryItemType {
        match self {
            Self::Song(_) => LibraryItemType::Song,
            Self::Album(_) => LibraryItemType::Album,
            Self::Playlist(_) => LibraryItemType::Playlist,
            Self::Artist(_) => LibraryItemType::Artist,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Self::Song(id) | Self::Album(id) | Self::Playlist(id) | Self::Artist(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_type_parse() {
        assert_eq!("ep".parse::<AlbumType>().unwrap(), AlbumType::Ep);

        let err = "invalid".parse::<AlbumType>().unwrap_err();
        assert_eq!(err.field(), Some("album_type"));
    }

    #[test]
    fn test_subscription_tier_parse() {
        assert_eq!("family".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Family);
        assert_eq!(
            "gold".parse::<SubscriptionTier>().unwrap_err().field(),
            Some("subscription_tier")
        );
    }

    #[test]
    fn test_targets_round_trip_kind_and_id() {
        let id = Uuid::new_v4();
        let like = LikeTarget::new(LikeableType::Playlist, id);
        assert_eq!(like, LikeTarget::Playlist(id));
        assert_eq!(like.kind(), LikeableType::Playlist);
        assert_eq!(like.id(), id);

        let follow = FollowTarget::new(FollowableType::Artist, id);
        assert_eq!(follow.kind(), FollowableType::Artist);
    }
}
