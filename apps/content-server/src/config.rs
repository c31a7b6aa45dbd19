//! Server configuration: YAML file, then `CONTENT__` environment variables,
//! then command line overrides

use crate::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Content service module settings
    pub content: content_service::config::Config,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Prefix the REST routes are nested under
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_string(),
            base_path: "/api/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://content.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = &cli.config {
            figment = figment.merge(Yaml::file(path));
        }
        let mut config: AppConfig = figment
            .merge(Env::prefixed("CONTENT__").split("__"))
            .extract()?;

        if let Some(bind) = &cli.bind {
            config.server.bind_addr = bind.clone();
        }
        if let Some(url) = &cli.database_url {
            config.database.url = url.clone();
        }
        if cli.json_logs {
            config.logging.json = true;
        }
        config.server.validate()?;
        Ok(config)
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        let path = self.base_path.trim();
        if !path.is_empty() && !path.starts_with('/') {
            anyhow::bail!("server.base_path must start with '/', got '{}'", self.base_path);
        }
        Ok(())
    }

    /// Nest prefix for the REST routes; `None` mounts them at the root
    pub fn api_prefix(&self) -> Option<&str> {
        let path = self.base_path.trim().trim_end_matches('/');
        (!path.is_empty()).then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_overrides_defaults() {
        let config: AppConfig = Figment::new()
            .merge(Yaml::string(
                "server:\n  bind_addr: 0.0.0.0:9000\ncontent:\n  max_query_limit: 50\n",
            ))
            .extract()
            .unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.server.base_path, "/api/v1");
        assert_eq!(config.content.max_query_limit, 50);
        assert!(config.content.sanitize_rich_text);
    }

    #[test]
    fn test_root_base_path_mounts_at_root() {
        let mut server = ServerConfig::default();
        assert_eq!(server.api_prefix(), Some("/api/v1"));

        for root in ["/", "", "  "] {
            server.base_path = root.to_string();
            assert!(server.validate().is_ok());
            assert_eq!(server.api_prefix(), None);
        }

        server.base_path = "/api/v2/".to_string();
        assert_eq!(server.api_prefix(), Some("/api/v2"));

        server.base_path = "api".to_string();
        assert!(server.validate().is_err());
    }

    #[test]
    fn test_unknown_module_key_rejected() {
        let result: Result<AppConfig, _> = Figment::new()
            .merge(Yaml::string("content:\n  max_items: 3\n"))
            .extract();
        assert!(result.is_err());
    }
}
