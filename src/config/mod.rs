use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Required to serve, optional to parse config.
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub firebase_project_id: Option<String>,
    pub jwks_url: String,
    pub site_admin_emails: Vec<String>,
    pub token_cache_ttl_secs: u64,
    pub jwks_refresh_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

pub const DEFAULT_PORT: u16 = 8022;

pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(v) = non_empty_var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = non_empty_var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = non_empty_var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = non_empty_var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Some(v) = non_empty_var("FIREBASE_PROJECT_ID") {
            self.auth.firebase_project_id = Some(v);
        }
        if let Some(v) = non_empty_var("FIREBASE_JWKS_URL") {
            self.auth.jwks_url = v;
        }
        if let Some(v) = non_empty_var("SITEADMIN_EMAILS") {
            self.auth.site_admin_emails = split_list(&v);
        }
        if let Some(v) = non_empty_var("AUTH_TOKEN_CACHE_TTL_SECS") {
            self.auth.token_cache_ttl_secs = v.parse().unwrap_or(self.auth.token_cache_ttl_secs);
        }
        if let Some(v) = non_empty_var("AUTH_JWKS_REFRESH_SECS") {
            self.auth.jwks_refresh_secs = v.parse().unwrap_or(self.auth.jwks_refresh_secs);
        }

        // Security overrides
        if let Some(v) = non_empty_var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = non_empty_var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: DEFAULT_PORT },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                firebase_project_id: None,
                jwks_url: FIREBASE_JWKS_URL.to_string(),
                site_admin_emails: Vec::new(),
                token_cache_ttl_secs: 300,
                jwks_refresh_secs: 3600,
            },
            security: SecurityConfig {
                enable_cors: true,
                // Empty means any origin
                cors_origins: Vec::new(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config
    }
}

/// Loads `.env.local` (taking precedence over the process environment) and then `.env`.
/// Both files are optional.
pub fn load_env_files() {
    let _ = dotenvy::from_filename_override(".env.local");
    let _ = dotenvy::dotenv();
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8022);
        assert_eq!(config.auth.token_cache_ttl_secs, 300);
        assert!(config.database.url.is_none());
        assert_eq!(config.auth.jwks_url, FIREBASE_JWKS_URL);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" a@x.com, ,B@y.com ,"),
            vec!["a@x.com".to_string(), "B@y.com".to_string()]
        );
    }
}
