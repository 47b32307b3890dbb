use std::{fmt, net::SocketAddr, str::FromStr};

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// Connection settings. `url` wins over the individual parts when present.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return url.parse().context("parse DATABASE_URL");
        }
        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .with_context(|| format!("invalid DB_SSLMODE {:?}", self.ssl_mode))?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            url: get("DATABASE_URL"),
            host: or("DB_HOST", "localhost"),
            port: parse_or(get("DB_PORT"), "DB_PORT", 5432)?,
            user: or("DB_USER", "postgres"),
            password: or("DB_PASSWORD", ""),
            name: or("DB_NAME", "academiaflow"),
            ssl_mode: or("DB_SSLMODE", "disable"),
            max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: parse_or(get("JWT_TTL_MINUTES"), "JWT_TTL_MINUTES", 24 * 60)?,
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        anyhow::ensure!(
            jwt.ttl_minutes <= MAX_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES} (one year)"
        );

        let cors_origins = or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database,
            jwt,
            host: or("APP_HOST", "0.0.0.0"),
            port: parse_or(get("APP_PORT"), "APP_PORT", 8080)?,
            cors_origins,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {v:?}")),
        None => Ok(default),
    }
}
