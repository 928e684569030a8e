use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} with this {field} already exists")]
    Duplicate { entity: &'static str, field: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} repository error: {source}")]
    Repository {
        entity: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify a store error raised while working on `entity`.
    ///
    /// Unique violations become [`AppError::Duplicate`] with the offending column,
    /// missing rows on update/delete become [`AppError::NotFound`], and everything
    /// else is wrapped with its cause preserved.
    pub fn from_db(entity: &'static str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                return Self::Duplicate {
                    entity,
                    field: constraint_field(&message),
                };
            }
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                return Self::Validation {
                    field: "reference".to_string(),
                    message: format!("{} references a missing row ({})", entity, message),
                };
            }
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(id) => Self::NotFound { entity, id },
            DbErr::RecordNotUpdated => Self::NotFound {
                entity,
                id: "record".to_string(),
            },
            source => Self::Repository { entity, source },
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Duplicate { field, .. } | Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        Self::from_db("record", err)
    }
}

/// Tables whose names may prefix a PostgreSQL constraint name, longest first so
/// `user_preferences` wins over `users`.
const TABLES: &[&str] = &[
    "listening_history",
    "user_preferences",
    "playlist_songs",
    "album_artists",
    "song_artists",
    "user_follows",
    "user_library",
    "user_likes",
    "playlists",
    "artists",
    "albums",
    "songs",
    "users",
];

/// Composite unique indexes, named after the column that makes a row a duplicate.
const UNIQUE_INDEXES: &[(&str, &str)] = &[
    ("idx_playlist_songs_unique", "song_id"),
    ("idx_user_likes_unique", "likeable_id"),
    ("idx_user_follows_unique", "followable_id"),
    ("idx_user_library_unique", "item_id"),
];

/// Pull the column name out of a unique-violation message.
///
/// SQLite reports `UNIQUE constraint failed: users.email`. PostgreSQL reports the
/// constraint name in quotes, either an index (`idx_users_username`) or a column
/// constraint (`users_email_key`).
fn constraint_field(message: &str) -> String {
    if let Some((_, columns)) = message.split_once("constraint failed:") {
        if let Some(last) = columns.split(',').last() {
            let column = last.trim();
            return column
                .rsplit_once('.')
                .map(|(_, col)| col)
                .unwrap_or(column)
                .to_string();
        }
    }

    let mut quoted = message.split('"');
    if let (Some(_), Some(name)) = (quoted.next(), quoted.next()) {
        return constraint_column(name);
    }

    "unknown".to_string()
}

fn constraint_column(name: &str) -> String {
    if let Some((_, column)) = UNIQUE_INDEXES.iter().find(|(index, _)| *index == name) {
        return column.to_string();
    }

    let bare = name.strip_prefix("idx_").unwrap_or(name);
    let bare = bare.strip_suffix("_key").unwrap_or(bare);
    TABLES
        .iter()
        .find_map(|table| bare.strip_prefix(table)?.strip_prefix('_'))
        .unwrap_or(bare)
        .to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "Resource not found"),
            Self::Duplicate { .. } => (StatusCode::CONFLICT, "Duplicate entry"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "Validation failed"),
            Self::Repository { ref source, .. } => {
                tracing::error!("Database error: {}", source);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            Self::Authentication(_) => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Authorization(_) => (StatusCode::FORBIDDEN, "Not allowed"),
            Self::Configuration(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured")
            }
            Self::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::Other(ref e) => {
                tracing::error!("Unexpected error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred")
            }
        };

        let mut body = json!({
            "error": error_message,
            "details": self.to_string(),
        });
        if let Some(field) = self.field() {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_field_sqlite() {
        assert_eq!(constraint_field("UNIQUE constraint failed: users.email"), "email");
        assert_eq!(
            constraint_field("UNIQUE constraint failed: playlist_songs.playlist_id, playlist_songs.song_id"),
            "song_id"
        );
    }

    #[test]
    fn test_constraint_field_postgres() {
        assert_eq!(
            constraint_field("duplicate key value violates unique constraint \"idx_users_username\""),
            "username"
        );
        assert_eq!(
            constraint_field("duplicate key value violates unique constraint \"users_email_key\""),
            "email"
        );
        assert_eq!(
            constraint_field("duplicate key value violates unique constraint \"user_preferences_user_id_key\""),
            "user_id"
        );
        assert_eq!(
            constraint_field("duplicate key value violates unique constraint \"idx_playlist_songs_unique\""),
            "song_id"
        );
        assert_eq!(constraint_field("something else"), "unknown");
    }

    #[test]
    fn test_record_not_updated_maps_to_not_found() {
        let err = AppError::from_db("Song", DbErr::RecordNotUpdated);
        assert!(matches!(err, AppError::NotFound { entity: "Song", .. }));
    }

    #[test]
    fn test_other_errors_keep_source() {
        let err = AppError::from_db("Album", DbErr::Custom("boom".to_string()));
        match err {
            AppError::Repository { entity, source } => {
                assert_eq!(entity, "Album");
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_status_and_field() {
        let err = AppError::validation("album_type", "must be one of album, single, ep, compilation");
        assert_eq!(err.field(), Some("album_type"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
