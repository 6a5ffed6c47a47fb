use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Interval between server-initiated WebSocket pings.
    pub heartbeat_interval: Duration,
    /// A connection silent for longer than this is dropped.
    pub client_timeout: Duration,
    pub db_pool_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL missing".into()))?;
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let heartbeat_interval = Duration::from_secs(
            env::var("WS_HEARTBEAT_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        );
        let client_timeout = Duration::from_secs(
            env::var("WS_CLIENT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );
        let db_pool_size = env::var("DB_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16);

        Ok(Self {
            database_url,
            port,
            heartbeat_interval,
            client_timeout,
            db_pool_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_applies_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/relay_test");
        env::remove_var("PORT");
        env::remove_var("WS_HEARTBEAT_INTERVAL_SECS");
        env::remove_var("WS_CLIENT_TIMEOUT_SECS");
        env::remove_var("DB_POOL_SIZE");

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(cfg.client_timeout, Duration::from_secs(30));
        assert_eq!(cfg.db_pool_size, 16);
    }
}
