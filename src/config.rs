use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_connect_timeout_seconds: u64,

    // Redis
    pub redis_url: String,
    pub redis_cache_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Auth
    pub auth_jwt_secret: String,
    pub auth_jwt_issuer: String,
    pub auth_jwt_audience: String,

    // Document uploads
    pub upload_dir: String,
    pub max_upload_bytes: usize,

    // Realtime events
    pub events_channel_capacity: usize,
}

/// Read an optional numeric variable, falling back to `default` when unset or unparsable.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::parse(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10);
        let database_connect_timeout_seconds = parse_or("DATABASE_CONNECT_TIMEOUT_SECONDS", 30);

        // Redis
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://redis:6379/0".to_string());
        let redis_cache_ttl_seconds = parse_or("REDIS_CACHE_TTL_SECONDS", 3600); // 1 hour default

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Auth
        let auth_jwt_secret = env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET must be set")?;
        let auth_jwt_issuer =
            env::var("AUTH_JWT_ISSUER").unwrap_or_else(|_| "portal-compras".to_string());
        let auth_jwt_audience =
            env::var("AUTH_JWT_AUDIENCE").unwrap_or_else(|_| "portal-compras-web".to_string());

        // Document uploads
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024);

        let events_channel_capacity = parse_or("EVENTS_CHANNEL_CAPACITY", 256usize).max(1);

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            database_connect_timeout_seconds,
            redis_url,
            redis_cache_ttl_seconds,
            cors_allow_origins,
            auth_jwt_secret,
            auth_jwt_issuer,
            auth_jwt_audience,
            upload_dir,
            max_upload_bytes,
            events_channel_capacity,
        })
    }
}
