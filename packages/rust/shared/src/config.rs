//! Application configuration for Flowsmith.
//!
//! User config lives at `~/.flowsmith/flowsmith.toml`.
//! Secrets never live in the file: each section names the environment
//! variable holding the secret, and runtime settings read it at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FlowsmithError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "flowsmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".flowsmith";

// ---------------------------------------------------------------------------
// Config structs (matching flowsmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat-completion endpoint settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// OAuth provider settings.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Element insertion settings.
    #[serde(default)]
    pub insertion: InsertionConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}

/// `[completion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat-completion endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Token budget for a single completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional client-side request timeout in seconds. Unset by default:
    /// the call waits for the provider to answer or fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.7
}

/// `[oauth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,

    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    #[serde(default = "default_redirect_uri_env")]
    pub redirect_uri_env: String,

    /// Provider token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Provider profile endpoint, queried with the new bearer token.
    #[serde(default = "default_profile_url")]
    pub profile_url: String,

    /// Whether to fetch the user profile after a successful exchange.
    #[serde(default = "default_true")]
    pub fetch_profile: bool,

    #[serde(default = "default_oauth_timeout")]
    pub timeout_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            redirect_uri_env: default_redirect_uri_env(),
            token_url: default_token_url(),
            profile_url: default_profile_url(),
            fetch_profile: true,
            timeout_secs: default_oauth_timeout(),
        }
    }
}

fn default_client_id_env() -> String {
    "WEBFLOW_CLIENT_ID".into()
}
fn default_client_secret_env() -> String {
    "WEBFLOW_CLIENT_SECRET".into()
}
fn default_redirect_uri_env() -> String {
    "WEBFLOW_REDIRECT_URI".into()
}
fn default_token_url() -> String {
    "https://api.webflow.com/oauth/access_token".into()
}
fn default_profile_url() -> String {
    "https://api.webflow.com/v2/token/authorized_by".into()
}
fn default_true() -> bool {
    true
}
fn default_oauth_timeout() -> u64 {
    30
}

/// `[insertion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionConfig {
    /// Seconds before a preview modal dismisses itself.
    #[serde(default = "default_preview_timeout")]
    pub preview_timeout_secs: u64,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            preview_timeout_secs: default_preview_timeout(),
        }
    }
}

fn default_preview_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Check that every configured endpoint is an absolute URL.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("completion.endpoint", &self.completion.endpoint),
            ("oauth.token_url", &self.oauth.token_url),
            ("oauth.profile_url", &self.oauth.profile_url),
        ] {
            Url::parse(value)
                .map_err(|e| FlowsmithError::config(format!("{field} '{value}' is not a URL: {e}")))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime settings (resolved from config + environment)
// ---------------------------------------------------------------------------

/// Read a secret from the environment. Empty values count as absent.
fn read_secret(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

/// Runtime completion settings, with the API key resolved from the environment.
#[derive(Clone)]
pub struct CompletionSettings {
    pub api_key: Option<String>,
    /// Env var the key was read from, for error messages.
    pub api_key_env: String,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl From<&AppConfig> for CompletionSettings {
    fn from(config: &AppConfig) -> Self {
        let c = &config.completion;
        Self {
            api_key: read_secret(&c.api_key_env),
            api_key_env: c.api_key_env.clone(),
            endpoint: c.endpoint.clone(),
            model: c.model.clone(),
            max_tokens: c.max_tokens,
            temperature: c.temperature,
            timeout_secs: c.timeout_secs,
        }
    }
}

/// Fully-present OAuth client credentials.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Runtime OAuth settings, with client credentials resolved from the environment.
#[derive(Clone)]
pub struct OAuthSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Env var names, in (id, secret, redirect) order, for error messages.
    pub env_names: [String; 3],
    pub token_url: String,
    pub profile_url: String,
    pub fetch_profile: bool,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("token_url", &self.token_url)
            .field("profile_url", &self.profile_url)
            .field("fetch_profile", &self.fetch_profile)
            .finish()
    }
}

impl From<&AppConfig> for OAuthSettings {
    fn from(config: &AppConfig) -> Self {
        let o = &config.oauth;
        Self {
            client_id: read_secret(&o.client_id_env),
            client_secret: read_secret(&o.client_secret_env),
            redirect_uri: read_secret(&o.redirect_uri_env),
            env_names: [
                o.client_id_env.clone(),
                o.client_secret_env.clone(),
                o.redirect_uri_env.clone(),
            ],
            token_url: o.token_url.clone(),
            profile_url: o.profile_url.clone(),
            fetch_profile: o.fetch_profile,
            timeout_secs: o.timeout_secs,
        }
    }
}

impl OAuthSettings {
    /// Return the credentials, or the names of every missing env var.
    pub fn credentials(&self) -> std::result::Result<OAuthCredentials, Vec<String>> {
        let values = [&self.client_id, &self.client_secret, &self.redirect_uri];
        let missing: Vec<String> = values
            .iter()
            .zip(&self.env_names)
            .filter(|(value, _)| value.is_none())
            .map(|(_, name)| name.clone())
            .collect();

        match (&self.client_id, &self.client_secret, &self.redirect_uri) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(OAuthCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                redirect_uri: redirect_uri.clone(),
            }),
            _ => Err(missing),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.flowsmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FlowsmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.flowsmith/flowsmith.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| FlowsmithError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        FlowsmithError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FlowsmithError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FlowsmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FlowsmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("WEBFLOW_CLIENT_SECRET"));
        assert!(toml_str.contains("preview_timeout_secs"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[completion]
model = "gpt-4o"

[oauth]
fetch_profile = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.completion.model, "gpt-4o");
        assert_eq!(config.completion.max_tokens, 1000);
        assert!((config.completion.temperature - 0.7).abs() < f32::EPSILON);
        assert!(!config.oauth.fetch_profile);
        assert_eq!(config.insertion.preview_timeout_secs, 10);
        assert_eq!(config.completion.timeout_secs, None);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn validate_rejects_relative_endpoint() {
        let mut config = AppConfig::default();
        config.oauth.token_url = "/oauth/token".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("oauth.token_url"));
    }

    #[test]
    fn load_config_from_reports_path_on_bad_toml() {
        let path = std::env::temp_dir().join("flowsmith-bad-config-test.toml");
        std::fs::write(&path, "[server\nbind = ").expect("write temp config");
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("flowsmith-bad-config-test.toml"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_api_key_resolves_to_none() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.completion.api_key_env = "FS_TEST_NONEXISTENT_KEY_12345".into();
        let settings = CompletionSettings::from(&config);
        assert!(settings.api_key.is_none());
        assert_eq!(settings.max_tokens, 1000);
    }

    #[test]
    fn oauth_credentials_report_every_missing_var() {
        let mut config = AppConfig::default();
        config.oauth.client_id_env = "FS_TEST_MISSING_ID_12345".into();
        config.oauth.client_secret_env = "FS_TEST_MISSING_SECRET_12345".into();
        config.oauth.redirect_uri_env = "FS_TEST_MISSING_REDIRECT_12345".into();
        let settings = OAuthSettings::from(&config);
        let missing = settings.credentials().err().expect("credentials should be missing");
        assert_eq!(missing.len(), 3);
        assert_eq!(missing[0], "FS_TEST_MISSING_ID_12345");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = CompletionSettings {
            api_key: Some("sk-live-secret".into()),
            api_key_env: "OPENAI_API_KEY".into(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: None,
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("sk-live-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
