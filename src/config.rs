use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FlowsightError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider ("gemini" or "openai")
    pub provider: String,

    /// Model name (e.g., "gemini-2.5-flash", "gpt-4")
    pub model: String,

    /// API key; the GEMINI_API_KEY / OPENAI_API_KEY environment
    /// variables take precedence over this field
    pub api_key: Option<String>,

    /// Base URL override for self-hosted or proxied endpoints
    pub base_url: Option<String>,

    /// Maximum tokens for LLM responses
    pub max_tokens: Option<u32>,

    /// Temperature for LLM responses (0.0 to 1.0)
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port; the PORT environment variable takes precedence
    pub port: u16,

    /// Origins allowed to make credentialed CORS requests
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file for the users table
    pub path: PathBuf,

    /// Insert sample rows when the users table is empty at startup
    pub seed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hosted UI domain of the OAuth identity provider
    pub domain: String,

    /// OAuth client id (OAUTH_CLIENT_ID overrides)
    pub client_id: String,

    /// OAuth client secret (OAUTH_CLIENT_SECRET overrides)
    pub client_secret: String,

    /// Redirect URI registered with the provider (REDIRECT_URI overrides)
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Users table storage
    pub database: DatabaseConfig,

    /// Hosted UI login settings
    pub auth: AuthConfig,

    /// LLM integration settings
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            database: DatabaseConfig {
                path: PathBuf::from("flowsight.db"),
                seed: true,
            },
            auth: AuthConfig {
                domain: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: "http://localhost:3000".to_string(),
            },
            llm: LlmConfig {
                provider: "gemini".to_string(),
                model: "gemini-2.5-flash".to_string(),
                api_key: None,
                base_url: None,
                max_tokens: Some(2000),
                temperature: Some(0.3),
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| FlowsightError::Config(e.to_string()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FlowsightError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(p) = path {
            if p.as_ref().exists() {
                return Self::load(p);
            }
            let mut config = Self::default();
            config.apply_env_overrides();
            return Ok(config);
        }

        // Try common config file locations
        let candidates = ["Flowsight.toml", "flowsight.toml", ".flowsight.toml"];
        for candidate in &candidates {
            if Path::new(candidate).exists() {
                return Self::load(candidate);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets and deployment settings come from the process environment
    /// when present, so the config file never has to hold credentials.
    fn apply_env_overrides(&mut self) {
        for key in ["GEMINI_API_KEY", "OPENAI_API_KEY"] {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    self.llm.api_key = Some(value);
                    break;
                }
            }
        }
        if let Ok(value) = std::env::var("OAUTH_CLIENT_ID") {
            self.auth.client_id = value;
        }
        if let Ok(value) = std::env::var("OAUTH_CLIENT_SECRET") {
            self.auth.client_secret = value;
        }
        if let Ok(value) = std::env::var("REDIRECT_URI") {
            self.auth.redirect_uri = value;
        }
        if let Ok(value) = std::env::var("PORT") {
            if let Ok(port) = value.parse() {
                self.server.port = port;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flowsight.toml");

        let mut config = Config::default();
        config.server.port = 9191;
        config.llm.model = "gemini-2.5-pro".to_string();
        config.save(&path).expect("save config");

        let loaded = Config::load(&path).expect("load config");
        assert_eq!(loaded.server.port, 9191);
        assert_eq!(loaded.llm.model, "gemini-2.5-pro");
        assert_eq!(loaded.llm.provider, "gemini");
    }

    #[test]
    fn test_missing_explicit_path_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("does-not-exist.toml");

        let config = Config::load_or_default(Some(&path)).expect("default config");
        assert_eq!(config.database.path, PathBuf::from("flowsight.db"));
        assert!(config.database.seed);
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "server = \"not a table\"").expect("write fixture");

        assert!(matches!(
            Config::load(&path),
            Err(FlowsightError::Config(_))
        ));
    }
}
