//! Runtime configuration loaded from environment variables
//!
//! `.env` loading happens in the binary (dotenvy); this module only reads
//! variables. Defaults match a local development database named `Wrangling`.
//!
//! Postgres: `DATABASE_URL`, or `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`,
//! `PGDATABASE`, plus `PG_MAX_CONNECTIONS`.
//! MongoDB: `MONGO_URL`, or `MONGO_HOST`, `MONGO_PORT`, `MONGO_USER`,
//! `MONGO_PASSWORD`, plus `MONGO_DATABASE`.
//! Sessions: `SESSION_SECRET`, `SESSION_COOKIE_SECURE`. Hashing: `BCRYPT_COST`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_DATABASE: &str = "Wrangling";
const DEFAULT_PG_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BCRYPT_COST: u32 = 12;

/// Session keys are derived from the secret; shorter secrets are refused.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which storage engine backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Relational variant: contacts + tables in Postgres
    Postgres,
    /// Document variant: collections in MongoDB
    Mongo,
    /// Process-local store, nothing persisted
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                var: "WRANGLE_BACKEND",
                value: s.to_owned(),
                reason: "expected postgres, mongo or memory",
            }),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Postgres => "postgres",
            Self::Mongo => "mongo",
            Self::Memory => "memory",
        })
    }
}

/// Postgres connection settings
#[derive(Clone)]
pub struct PostgresConfig {
    /// Full connection URL; when set, the discrete fields are ignored
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub max_connections: u32,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &self.url.as_ref().map(|_| "<set>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// MongoDB connection settings
#[derive(Clone)]
pub struct MongoConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl MongoConfig {
    /// Credentials are only used when both user and password are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("url", &self.url.as_ref().map(|_| "<set>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish()
    }
}

/// Session cookie settings
#[derive(Clone, Default)]
pub struct SessionConfig {
    /// Secret the cookie key is derived from; `None` means a random per-process key
    pub secret: Option<String>,
    /// Set the `Secure` attribute on the session cookie
    pub secure_cookie: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<set>"))
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct WrangleConfig {
    pub backend: Backend,
    pub postgres: PostgresConfig,
    pub mongo: MongoConfig,
    pub session: SessionConfig,
    pub bcrypt_cost: u32,
}

impl WrangleConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("WRANGLE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => Backend::Postgres,
        };

        let postgres = PostgresConfig {
            url: var("DATABASE_URL"),
            host: var("PGHOST").unwrap_or_else(|| "localhost".to_owned()),
            port: parse_or("PGPORT", var("PGPORT"), 5432)?,
            user: var("PGUSER").unwrap_or_else(|| "postgres".to_owned()),
            password: var("PGPASSWORD"),
            database: var("PGDATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
            max_connections: parse_or(
                "PG_MAX_CONNECTIONS",
                var("PG_MAX_CONNECTIONS"),
                DEFAULT_PG_MAX_CONNECTIONS,
            )?,
        };

        let mongo = MongoConfig {
            url: var("MONGO_URL"),
            host: var("MONGO_HOST").unwrap_or_else(|| "localhost".to_owned()),
            port: parse_or("MONGO_PORT", var("MONGO_PORT"), 27017)?,
            user: var("MONGO_USER"),
            password: var("MONGO_PASSWORD"),
            database: var("MONGO_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
        };

        let secret = var("SESSION_SECRET");
        if let Some(s) = &secret {
            if s.len() < MIN_SESSION_SECRET_LEN {
                return Err(ConfigError::InvalidValue {
                    var: "SESSION_SECRET",
                    value: "<redacted>".to_owned(),
                    reason: "must be at least 32 bytes",
                });
            }
        }
        let session = SessionConfig {
            secret,
            secure_cookie: parse_bool("SESSION_COOKIE_SECURE", var("SESSION_COOKIE_SECURE"))?,
        };

        let bcrypt_cost = parse_or("BCRYPT_COST", var("BCRYPT_COST"), DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                var: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31",
            });
        }

        Ok(Self {
            backend,
            postgres,
            mongo,
            session,
            bcrypt_cost,
        })
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var,
            value: raw,
            reason: "not a valid number",
        }),
    }
}

fn parse_bool(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue {
            var,
            value: v,
            reason: "expected true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<WrangleConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WrangleConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.backend, Backend::Postgres);
        assert_eq!(cfg.postgres.host, "localhost");
        assert_eq!(cfg.postgres.port, 5432);
        assert_eq!(cfg.postgres.user, "postgres");
        assert_eq!(cfg.postgres.database, "Wrangling");
        assert_eq!(cfg.postgres.max_connections, 5);
        assert_eq!(cfg.mongo.port, 27017);
        assert!(cfg.mongo.credentials().is_none());
        assert!(cfg.session.secret.is_none());
        assert_eq!(cfg.bcrypt_cost, 12);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("WRANGLE_BACKEND", "mongodb"),
            ("MONGO_HOST", "db"),
            ("MONGO_PORT", "27018"),
            ("MONGO_USER", "root"),
            ("MONGO_PASSWORD", "pw"),
            ("SESSION_COOKIE_SECURE", "true"),
            ("BCRYPT_COST", "4"),
        ])
        .unwrap();
        assert_eq!(cfg.backend, Backend::Mongo);
        assert_eq!(cfg.mongo.host, "db");
        assert_eq!(cfg.mongo.port, 27018);
        assert_eq!(cfg.mongo.credentials(), Some(("root", "pw")));
        assert!(cfg.session.secure_cookie);
        assert_eq!(cfg.bcrypt_cost, 4);
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("PGPORT", "fivefourthreetwo")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "PGPORT", .. }));
    }

    #[test]
    fn rejects_short_session_secret() {
        let err = config_from(&[("SESSION_SECRET", "short")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "SESSION_SECRET", .. }));
        assert!(config_from(&[("SESSION_SECRET", &"s".repeat(32))]).is_ok());
    }

    #[test]
    fn backend_names() {
        assert_eq!("pg".parse::<Backend>().unwrap(), Backend::Postgres);
        assert_eq!("Memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert!("sqlite".parse::<Backend>().is_err());
    }

    #[test]
    fn debug_hides_secrets() {
        let cfg = config_from(&[
            ("DATABASE_URL", "postgres://u:topsecret@h/db"),
            ("PGPASSWORD", "topsecret"),
        ])
        .unwrap();
        assert!(!format!("{cfg:?}").contains("topsecret"));
    }
}
