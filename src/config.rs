use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cert_api: CertApiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to derive redemption links (no trailing slash)
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/veritrace.sqlite".to_string(),
        }
    }
}

/// External certificate API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CertApiConfig {
    pub api_key: String,
}

impl Default for CertApiConfig {
    fn default() -> Self {
        Self {
            api_key: "dev-cert-api-key".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let db = DatabaseConfig::default();
        assert!(db.url.starts_with("sqlite://"));

        let cert = CertApiConfig::default();
        assert_eq!(cert.api_key, "dev-cert-api-key");
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
log_level: "debug"
log_dir: "logs"
log_file: "test.log"
use_json: false
rotation: "never"
enable_tracing: true
server:
  host: "127.0.0.1"
  port: 3000
  base_url: "http://localhost:3000"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 3000);
        // Omitted sections fall back to defaults
        assert_eq!(config.cert_api.api_key, "dev-cert-api-key");
    }
}
