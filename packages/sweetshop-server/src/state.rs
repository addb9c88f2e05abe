use sea_orm::DatabaseConnection;

use crate::bootstrap::config::ServerConfig;
use crate::services::auth::JwtKeys;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) db: DatabaseConnection,
    pub(crate) keys: JwtKeys,
    pub(crate) config: ServerConfig,
}

impl AppState {
    pub(crate) fn new(db: DatabaseConnection, config: ServerConfig) -> Self {
        let keys = JwtKeys::new(&config.jwt_secret, config.token_ttl());
        Self { db, keys, config }
    }
}
