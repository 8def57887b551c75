use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BCRYPT_COST, DEFAULT_HEALTH_CHECK_TIMEOUT_MS, DEFAULT_POOL_SIZE,
    DEFAULT_TOKEN_TTL_HOURS, MIN_JWT_SECRET_LEN,
};

/// Where the database lives
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    /// Full connection string (`DATABASE_URL` or `NEON_DATABASE_URL`)
    Url(String),
    /// Individual `DB_*` settings
    Discrete {
        host: String,
        user: String,
        password: String,
        name: String,
        port: u16,
    },
}

impl DatabaseConfig {
    /// Human-readable target without credentials, for startup logs
    pub fn describe(&self) -> String {
        match self {
            DatabaseConfig::Url(_) => "connection string".to_string(),
            DatabaseConfig::Discrete {
                host, port, name, ..
            } => format!("{}:{}/{}", host, port, name),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub max_connections: u32,
    /// `None` allows any origin
    pub allowed_origins: Option<Vec<String>>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Longest the health endpoint waits on the database
    pub health_check_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_host = get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = parse_or(&get, "PORT", 5000u16)?;

        let database = match get("DATABASE_URL").or_else(|| get("NEON_DATABASE_URL")) {
            Some(url) => DatabaseConfig::Url(url),
            None => {
                let required = ["DB_HOST", "DB_USER", "DB_PASSWORD", "DB_NAME"];
                let missing: Vec<&str> = required
                    .iter()
                    .copied()
                    .filter(|&key| get(key).is_none())
                    .collect();
                if !missing.is_empty() {
                    return Err(format!(
                        "Missing database configuration: set DATABASE_URL, or all of {} (missing: {})",
                        required.join(", "),
                        missing.join(", ")
                    ));
                }

                DatabaseConfig::Discrete {
                    host: get("DB_HOST").unwrap_or_default(),
                    user: get("DB_USER").unwrap_or_default(),
                    password: get("DB_PASSWORD").unwrap_or_default(),
                    name: get("DB_NAME").unwrap_or_default(),
                    port: parse_or(&get, "DB_PORT", 5432u16)?,
                }
            }
        };

        let max_connections = parse_or(&get, "DB_MAX_CLIENTS", DEFAULT_POOL_SIZE)?;
        if max_connections == 0 {
            return Err("DB_MAX_CLIENTS must be at least 1".to_string());
        }

        let allowed_origins = get("ALLOWED_ORIGINS").map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let jwt_secret = get("JWT_SECRET").ok_or("JWT_SECRET must be set for token signing")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} bytes long",
                MIN_JWT_SECRET_LEN
            ));
        }

        let token_ttl_hours = parse_or(&get, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if token_ttl_hours <= 0 {
            return Err("TOKEN_TTL_HOURS must be positive".to_string());
        }

        let bcrypt_cost = parse_or(&get, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err("BCRYPT_COST must be between 4 and 31".to_string());
        }

        let health_check_timeout_ms = parse_or(
            &get,
            "HEALTH_CHECK_TIMEOUT_MS",
            DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
        )?;
        if health_check_timeout_ms == 0 {
            return Err("HEALTH_CHECK_TIMEOUT_MS must be positive".to_string());
        }

        Ok(Config {
            server_host,
            server_port,
            database,
            max_connections,
            allowed_origins,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            health_check_timeout: Duration::from_millis(health_check_timeout_ms),
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| format!("Invalid {}", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_database_url() {
        let config = load(&[
            ("DATABASE_URL", "postgres://u:p@localhost/notes"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.server_address(), "0.0.0.0:5000");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.health_check_timeout, Duration::from_secs(2));
        assert!(config.allowed_origins.is_none());
        assert!(matches!(config.database, DatabaseConfig::Url(_)));
    }

    #[test]
    fn test_neon_url_is_accepted() {
        let config = load(&[
            ("NEON_DATABASE_URL", "postgres://u:p@neon/notes"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();
        assert!(matches!(config.database, DatabaseConfig::Url(ref url) if url.contains("neon")));
    }

    #[test]
    fn test_discrete_database_settings() {
        let config = load(&[
            ("DB_HOST", "db.internal"),
            ("DB_USER", "revisor"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "notes"),
            ("DB_PORT", "6543"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();

        match config.database {
            DatabaseConfig::Discrete { ref host, port, .. } => {
                assert_eq!(host, "db.internal");
                assert_eq!(port, 6543);
            }
            _ => panic!("expected discrete settings"),
        }
        assert_eq!(config.database.describe(), "db.internal:6543/notes");
    }

    #[test]
    fn test_missing_database_settings_are_listed() {
        let err = load(&[("DB_HOST", "db.internal"), ("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.contains("DB_USER"));
        assert!(err.contains("DB_PASSWORD"));
        assert!(err.contains("DB_NAME"));
        assert!(!err.contains("missing: DB_HOST"));
    }

    #[test]
    fn test_jwt_secret_is_required() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/notes")]).unwrap_err();
        assert!(err.contains("JWT_SECRET"));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("JWT_SECRET", "short"),
        ])
        .unwrap_err();
        assert!(err.contains("at least"));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("JWT_SECRET", SECRET),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert_eq!(err, "Invalid PORT");

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("JWT_SECRET", SECRET),
            ("BCRYPT_COST", "2"),
        ])
        .unwrap_err();
        assert!(err.contains("BCRYPT_COST"));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("JWT_SECRET", SECRET),
            ("HEALTH_CHECK_TIMEOUT_MS", "0"),
        ])
        .unwrap_err();
        assert!(err.contains("HEALTH_CHECK_TIMEOUT_MS"));
    }

    #[test]
    fn test_allowed_origins_and_blank_values() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("JWT_SECRET", SECRET),
            ("ALLOWED_ORIGINS", "http://localhost:5173, https://revisor.app"),
            ("PORT", "   "),
        ])
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            Some(vec![
                "http://localhost:5173".to_string(),
                "https://revisor.app".to_string()
            ])
        );
        assert_eq!(config.server_port, 5000);
    }
}
