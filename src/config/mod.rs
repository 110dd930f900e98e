use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Page size used when a listing request does not carry `limit`
    pub default_limit: i64,
    /// Hard cap applied to any requested `limit`
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub cors_origins: Vec<String>,
}

/// 8 days
pub const DEFAULT_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 8;

/// Ten years; longer lifetimes are rejected
pub const MAX_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 365 * 10;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // API overrides
        if let Ok(v) = env::var("PHRM_HOST") {
            self.api.host = v;
        }
        if let Some(port) = env::var("PHRM_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_DEFAULT_LIMIT") {
            self.api.default_limit = v.parse().unwrap_or(self.api.default_limit);
        }
        if let Ok(v) = env::var("API_MAX_LIMIT") {
            self.api.max_limit = v.parse().unwrap_or(self.api.max_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("SECRET_KEY") {
            if !v.trim().is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.access_token_expire_minutes =
                parse_expire_minutes(&v, self.security.access_token_expire_minutes);
        }
        if let Ok(v) = env::var("BACKEND_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "sqlite://phrm.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                default_limit: 100,
                max_limit: 1000,
            },
            security: SecurityConfig {
                jwt_secret: generate_secret(),
                access_token_expire_minutes: DEFAULT_TOKEN_EXPIRE_MINUTES,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:3001".to_string(),
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                    "http://127.0.0.1:3001".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: "sqlite://phrm.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                default_limit: 100,
                max_limit: 500,
            },
            security: SecurityConfig {
                jwt_secret: generate_secret(),
                access_token_expire_minutes: DEFAULT_TOKEN_EXPIRE_MINUTES,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: "sqlite://phrm.db?mode=rwc".to_string(),
                max_connections: 20,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                default_limit: 100,
                max_limit: 100,
            },
            security: SecurityConfig {
                jwt_secret: generate_secret(),
                access_token_expire_minutes: DEFAULT_TOKEN_EXPIRE_MINUTES,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// Configuration for tests: in-memory database and a fixed signing key.
    pub fn for_tests() -> Self {
        let mut config = Self::development();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        config.security.jwt_secret = "test-secret-key".to_string();
        config
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// Token lifetime in minutes, falling back to `default` when `raw` is not a
/// number in `1..=MAX_TOKEN_EXPIRE_MINUTES`
fn parse_expire_minutes(raw: &str, default: i64) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_TOKEN_EXPIRE_MINUTES).contains(&minutes) => minutes,
        _ => {
            tracing::warn!(
                "Ignoring ACCESS_TOKEN_EXPIRE_MINUTES={:?}; expected 1..={}",
                raw,
                MAX_TOKEN_EXPIRE_MINUTES
            );
            default
        }
    }
}

/// Random signing key for processes started without `SECRET_KEY`.
/// Tokens issued with it do not survive a restart.
fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(43)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.max_limit, 1000);
        assert_eq!(config.api.default_limit, 100);
        assert_eq!(config.security.access_token_expire_minutes, 60 * 24 * 8);
        assert!(config.is_development());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.max_limit, 100);
        assert!(!config.is_development());
    }

    #[test]
    fn expire_minutes_outside_bounds_fall_back() {
        let default = DEFAULT_TOKEN_EXPIRE_MINUTES;
        assert_eq!(parse_expire_minutes("30", default), 30);
        assert_eq!(parse_expire_minutes(" 45 ", default), 45);
        assert_eq!(parse_expire_minutes("0", default), default);
        assert_eq!(parse_expire_minutes("-5", default), default);
        assert_eq!(parse_expire_minutes("9223372036854775807", default), default);
        assert_eq!(parse_expire_minutes("99999999999999999999", default), default);
        assert_eq!(parse_expire_minutes("soon", default), default);
        assert_eq!(
            parse_expire_minutes(&MAX_TOKEN_EXPIRE_MINUTES.to_string(), default),
            MAX_TOKEN_EXPIRE_MINUTES
        );
    }

    #[test]
    fn generated_secrets_differ() {
        let a = AppConfig::development().security.jwt_secret;
        let b = AppConfig::development().security.jwt_secret;
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }
}
