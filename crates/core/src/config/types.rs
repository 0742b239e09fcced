use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Lifetime of a sign-in session (local auth only).
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
}

fn default_session_ttl_hours() -> u32 {
    24 * 30
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Everyone is a guest; mutating operations are no-ops.
    None,
    /// Email/password accounts stored next to the document database.
    Local,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("phonelist.db")
}

/// Catalog configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// JSON file with an array of catalog items, imported at startup.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub catalog_seeded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub session_ttl_hours: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::Local => "local".to_string(),
                },
                session_ttl_hours: config.auth.session_ttl_hours,
            },
            server: config.server.clone(),
            catalog_seeded: config.catalog.seed_path.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_valid_config_with_local_auth() {
        let toml = r#"
[auth]
method = "local"

[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::Local);
        assert_eq!(config.auth.session_ttl_hours, 720);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let toml = r#"
[auth]
method = "none"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "phonelist.db");
        assert!(config.catalog.seed_path.is_none());
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_catalog_seed() {
        let toml = r#"
[auth]
method = "none"

[catalog]
seed_path = "/data/phones.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.catalog.seed_path.unwrap().to_str().unwrap(),
            "/data/phones.json"
        );
    }

    #[test]
    fn test_sanitized_config() {
        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::Local,
                session_ttl_hours: 12,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            catalog: CatalogConfig {
                seed_path: Some(PathBuf::from("phones.json")),
            },
        };
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "local");
        assert_eq!(sanitized.auth.session_ttl_hours, 12);
        assert_eq!(sanitized.server.port, 8080);
        assert!(sanitized.catalog_seeded);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("phonelist.db"));
    }
}
