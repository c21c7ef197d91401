//! Application configuration for the Blackstar client.
//!
//! User config lives at `~/.blackstar/blackstar.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BlackstarError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "blackstar.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".blackstar";

// ---------------------------------------------------------------------------
// Config structs (matching blackstar.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Blackstar server origin, e.g. `https://cms.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[auth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

fn default_token_env() -> String {
    "BLACKSTAR_TOKEN".into()
}

// ---------------------------------------------------------------------------
// Client config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime client configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Bearer token, if one was found in the environment.
    pub token: Option<String>,
}

impl ClientConfig {
    /// Build a config for `base_url` with default timeout and no token.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(default_timeout_secs()),
            token: None,
        })
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl TryFrom<&AppConfig> for ClientConfig {
    type Error = BlackstarError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.server.base_url)?,
            timeout: Duration::from_secs(config.server.timeout_secs),
            token: resolve_token(config),
        })
    }
}

/// Parse and sanity-check a server origin.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| BlackstarError::validation(format!("invalid base URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BlackstarError::validation(format!(
            "unsupported scheme '{other}' in base URL '{raw}'"
        ))),
    }
}

/// Read the bearer token from the env var named in `[auth] token_env`.
pub fn resolve_token(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.auth.token_env) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.blackstar/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BlackstarError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.blackstar/blackstar.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BlackstarError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BlackstarError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BlackstarError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| BlackstarError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BlackstarError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("BLACKSTAR_TOKEN"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[server]
base_url = "https://cms.example.com"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.base_url, "https://cms.example.com");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.auth.token_env, "BLACKSTAR_TOKEN");
    }

    #[test]
    fn client_config_from_app_config() {
        let mut app = AppConfig::default();
        app.server.timeout_secs = 5;
        // Unique env var name so no other test can set it.
        app.auth.token_env = "BLACKSTAR_TEST_UNSET_TOKEN_81723".into();

        let client = ClientConfig::try_from(&app).expect("client config");
        assert_eq!(client.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert!(client.token.is_none());
    }

    #[test]
    fn base_url_rejects_garbage_and_other_schemes() {
        assert!(parse_base_url("not a url").is_err());
        let err = parse_base_url("ftp://cms.example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("blackstar-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[auth]\ntoken_env = \"CMS_TOKEN\"\n").expect("write");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.auth.token_env, "CMS_TOKEN");
        assert_eq!(config.server.base_url, "http://localhost:8080");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/blackstar.toml")).unwrap_err();
        assert!(matches!(err, BlackstarError::Io { .. }));
    }
}
