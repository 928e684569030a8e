use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::player::LibrarySession;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub session: Arc<RwLock<LibrarySession>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, session: LibrarySession) -> Self {
        Self {
            db,
            config: Arc::new(config),
            session: Arc::new(RwLock::new(session)),
        }
    }
}
