use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Which columns a user record carries and which routes are mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserSchema {
    /// Profile fields only; plain JSON CRUD.
    #[default]
    Basic,
    /// Profile fields plus a unique email and a password hash; auth routes enabled.
    Credentials,
}

impl UserSchema {
    pub fn has_credentials(self) -> bool {
        matches!(self, UserSchema::Credentials)
    }
}

impl FromStr for UserSchema {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(UserSchema::Basic),
            "credentials" | "auth" => Ok(UserSchema::Credentials),
            other => anyhow::bail!("unknown USER_SCHEMA '{}'", other),
        }
    }
}

/// Where user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    /// Process-local table, lost on restart.
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => anyhow::bail!("unknown USER_STORE '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: String,
    pub max_connections: u32,
    pub schema: UserSchema,
    pub jwt: Option<JwtConfig>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("USER_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => StoreKind::default(),
        };
        let database_url = match (std::env::var("DATABASE_URL"), store) {
            (Ok(url), _) => url,
            (Err(_), StoreKind::Postgres) => database_url_from_parts()?,
            (Err(_), StoreKind::Memory) => String::new(),
        };
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let schema = match std::env::var("USER_SCHEMA") {
            Ok(v) => v.parse()?,
            Err(_) => UserSchema::default(),
        };

        let secret = std::env::var("JWT_SECRET").or_else(|_| std::env::var("SECRET_KEY"));
        let jwt = match secret {
            Ok(secret) => Some(JwtConfig {
                secret,
                issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "userdesk".into()),
                audience: std::env::var("JWT_AUDIENCE")
                    .unwrap_or_else(|_| "userdesk-users".into()),
                ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(60),
                refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(60 * 24 * 14),
            }),
            Err(_) => None,
        };

        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse().with_context(|| format!("invalid APP_PORT '{}'", v))?,
            Err(_) => 8080,
        };

        let config = Self {
            store,
            database_url,
            max_connections,
            schema,
            jwt,
            host,
            port,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.schema.has_credentials() && self.jwt.is_none() {
            anyhow::bail!("USER_SCHEMA=credentials requires JWT_SECRET (or SECRET_KEY)");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn database_url_from_parts() -> anyhow::Result<String> {
    let user = std::env::var("DB_USER").context("DATABASE_URL or DB_USER must be set")?;
    let password = std::env::var("DB_PASSWORD").context("DB_PASSWORD must be set")?;
    let host = std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
    let name = std::env::var("DB_NAME").context("DB_NAME must be set")?;
    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, name
    ))
}
