use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub music_folder_path: Option<String>,
    pub maintenance_schedule: String,
    pub history_retention_days: i64,
    pub inactive_user_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            music_folder_path: env::var("MUSIC_FOLDER").ok(),
            maintenance_schedule: env::var("MAINTENANCE_SCHEDULE")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()),
            history_retention_days: env::var("HISTORY_RETENTION_DAYS")
                .unwrap_or_else(|_| "365".to_string())
                .parse()
                .context("HISTORY_RETENTION_DAYS must be a whole number of days")?,
            inactive_user_days: env::var("INACTIVE_USER_DAYS")
                .unwrap_or_else(|_| "730".to_string())
                .parse()
                .context("INACTIVE_USER_DAYS must be a whole number of days")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
