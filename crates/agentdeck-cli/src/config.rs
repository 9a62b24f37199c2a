use agentdeck_client::ClientConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub playground: PlaygroundConfig,
    pub logging: LoggingConfig,

    // Secret (from ENV only)
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    agentdeck_client::config::DEFAULT_CONNECT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaygroundConfig {
    /// Agent used until `/agent` picks another one
    #[serde(default)]
    pub default_agent: Option<String>,
    #[serde(default = "default_page_size")]
    pub history_page_size: u32,
}

fn default_page_size() -> u32 {
    20
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            default_agent: None,
            history_page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (AGENTDECK__API__BASE_URL, AGENTDECK__LOGGING__LEVEL, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("AGENTDECK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // The API may run without auth, so the token is optional
        cfg.token = std::env::var("AGENTDECK_TOKEN").unwrap_or_default();

        Ok(cfg)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api.base_url.clone())
            .with_auth_token(self.token.clone())
            .with_connect_timeout(self.api.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [api]
            base_url = "https://agents.example.com/api"
            connect_timeout_secs = 3

            [playground]
            default_agent = "demo"
            history_page_size = 5

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.connect_timeout_secs, 3);
        assert_eq!(config.playground.default_agent.as_deref(), Some("demo"));
        assert_eq!(config.playground.history_page_size, 5);
        assert!(config.token.is_empty());
    }

    #[test]
    fn test_playground_section_is_optional() {
        let toml = r#"
            [api]
            base_url = "http://localhost:8000/api"

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.connect_timeout_secs, 10);
        assert_eq!(config.playground.default_agent, None);
        assert_eq!(config.playground.history_page_size, 20);
    }

    #[test]
    fn test_client_config_carries_token() {
        let toml = r#"
            [api]
            base_url = "http://localhost:8000/api"

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let mut config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.client_config().auth_token, None);

        config.token = "secret".to_string();
        let client = config.client_config();
        assert_eq!(client.auth_token.as_deref(), Some("secret"));
        assert_eq!(client.base_url, "http://localhost:8000/api");
    }
}
