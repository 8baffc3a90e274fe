use std::env;
use std::net::SocketAddr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Postgres URL. When unset the server keeps everything in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// `RUST_ENV=production`; enables HSTS.
    pub production: bool,
    /// HS256 secret shared with the identity provider. Required with a database.
    pub id_token_secret: Option<String>,
    pub id_token_issuer: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let port = lookup("PORT")
            .and_then(|p| match p.parse() {
                Ok(port) => Some(port),
                Err(e) => {
                    tracing::warn!("Config: Invalid PORT '{}': {}", p, e);
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|n| n.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let id_token_secret = lookup("AUTH_ID_TOKEN_SECRET").filter(|s| !s.trim().is_empty());
        let id_token_issuer = lookup("AUTH_ID_TOKEN_ISSUER").filter(|s| !s.trim().is_empty());

        Self {
            database_url,
            database_max_connections,
            port,
            allowed_origins,
            production,
            id_token_secret,
            id_token_issuer,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert!(!config.production);
        assert_eq!(config.id_token_secret, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/hacktrack"),
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", " https://dash.example.com , ,"),
            ("RUST_ENV", "Production"),
            ("AUTH_ID_TOKEN_SECRET", "s3cret"),
            ("AUTH_ID_TOKEN_ISSUER", ""),
        ]);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/hacktrack")
        );
        assert_eq!(config.bind_addr().port(), 8080);
        assert_eq!(config.allowed_origins, vec!["https://dash.example.com"]);
        assert!(config.production);
        assert_eq!(config.id_token_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.id_token_issuer, None);
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  "), ("PORT", "not-a-port")]);
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
