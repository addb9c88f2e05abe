use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::warn;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DB_URL: &str = "sqlite://sweetshop.db?mode=rwc";
const DEFAULT_JWT_SECRET: &str = "sweetshop_default_jwt_secret_change_in_production";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
    #[error("SWEETSHOP_JWT_SECRET is too short (minimum 32 characters required)")]
    WeakSecret,
}

#[derive(Clone)]
pub(crate) struct ServerConfig {
    pub(crate) addr: SocketAddr,
    pub(crate) db_url: String,
    pub(crate) jwt_secret: String,
    pub(crate) token_ttl_hours: i64,
    pub(crate) bcrypt_cost: u32,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("db_url", &self.db_url)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl ServerConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_text = lookup("SWEETSHOP_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_text
            .parse()
            .map_err(|_| ConfigError::Invalid("SWEETSHOP_ADDR", addr_text.clone()))?;

        let db_url = lookup("SWEETSHOP_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string());

        let jwt_secret = lookup("SWEETSHOP_JWT_SECRET").unwrap_or_else(|| {
            warn!("Using default JWT secret. Please set SWEETSHOP_JWT_SECRET environment variable in production!");
            DEFAULT_JWT_SECRET.to_string()
        });
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let token_ttl_hours = match lookup("SWEETSHOP_TOKEN_TTL_HOURS") {
            Some(text) => text
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::Invalid("SWEETSHOP_TOKEN_TTL_HOURS", text))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let bcrypt_cost = match lookup("SWEETSHOP_BCRYPT_COST") {
            Some(text) => text
                .parse::<u32>()
                .ok()
                .filter(|cost| (4..=31).contains(cost))
                .ok_or(ConfigError::Invalid("SWEETSHOP_BCRYPT_COST", text))?,
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            addr,
            db_url,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
        })
    }

    pub(crate) fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }

    /// 便于日志打印的本地访问地址
    pub(crate) fn display_addr(&self) -> String {
        format!("http://{}", self.addr.to_string().replace("0.0.0.0", "127.0.0.1"))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        addr: DEFAULT_ADDR.parse().unwrap(),
        db_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_that_is_at_least_32_chars_long".to_string(),
        token_ttl_hours: 1,
        bcrypt_cost: 4,
    }
}
