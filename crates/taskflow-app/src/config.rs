use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use serde::Deserialize;

const CONFIG_DIR: &str = "taskflow";
const CONFIG_FILE: &str = "config.toml";
const STORAGE_FILE: &str = "storage.json";

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "TASKFLOW_API_URL";

/// Top-level client configuration loaded from `<config dir>/taskflow/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientConfig {
    /// REST endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Session persistence settings.
    #[serde(default)]
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Load configuration from `explicit` when given, otherwise from the default location.
    ///
    /// An explicit path must exist; a missing default file yields the built-in defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                Self::from_path(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse and validate the given TOML file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/taskflow/config.toml`, when the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Replace the API base URL (command-line flag or environment) and re-validate.
    ///
    /// # Errors
    /// Returns an error when the new URL is not an absolute http(s) URL.
    pub fn with_api_url(mut self, url: Option<String>) -> Result<Self> {
        if let Some(url) = url {
            self.api.base_url = url;
            self.validate()?;
        }
        Ok(self)
    }

    /// File backing the persisted session.
    ///
    /// # Errors
    /// Returns an error when no override is set and the platform has no data dir.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session.storage_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(STORAGE_FILE))
            .ok_or_else(|| anyhow!("failed to resolve a data directory; set session.storage_path"))
    }

    fn validate(&self) -> Result<()> {
        self.api.validate()
    }
}

/// `[api]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root of the REST API, e.g. `http://localhost:5000/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with the default timeout.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid api.base_url '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api.base_url must use http or https: {}", self.base_url);
        }
        if self.timeout_secs == 0 {
            bail!("api.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// `[session]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Persist the session after login unless told otherwise.
    #[serde(default = "default_remember")]
    pub remember: bool,
    /// Override for the session storage file.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            remember: default_remember(),
            storage_path: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_remember() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_sections_use_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "")?;
        let cfg = ClientConfig::from_path(&path)?;
        assert_eq!(cfg.api.base_url, DEFAULT_API_URL);
        assert_eq!(cfg.api.timeout(), Duration::from_secs(30));
        assert!(cfg.session.remember);
        assert!(cfg.session.storage_path.is_none());
        Ok(())
    }

    #[test]
    fn load_config_with_all_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        let mut file = fs::File::create(&path)?;
        writeln!(
            file,
            "[api]\nbase_url = \"https://tasks.example.com/api\"\ntimeout_secs = 5\n\n[session]\nremember = false\nstorage_path = \"/tmp/taskflow.json\""
        )?;

        let cfg = ClientConfig::load(Some(&path))?;
        assert_eq!(cfg.api.base_url, "https://tasks.example.com/api");
        assert_eq!(cfg.api.timeout_secs, 5);
        assert!(!cfg.session.remember);
        assert_eq!(cfg.storage_path()?, PathBuf::from("/tmp/taskflow.json"));
        Ok(())
    }

    #[test]
    fn explicit_missing_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let err = ClientConfig::load(Some(&dir.path().join("nope.toml")))
            .err()
            .ok_or_else(|| anyhow!("expected missing file error"))?;
        assert!(err.to_string().contains("does not exist"));
        Ok(())
    }

    #[test]
    fn invalid_urls_and_timeouts_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[api]\nbase_url = \"ftp://example.com\"\n")?;
        assert!(ClientConfig::from_path(&path).is_err());

        fs::write(&path, "[api]\ntimeout_secs = 0\n")?;
        assert!(ClientConfig::from_path(&path).is_err());

        assert!(ClientConfig::default().with_api_url(Some("not a url".into())).is_err());
        Ok(())
    }

    #[test]
    fn api_url_override_replaces_base_url() -> Result<()> {
        let cfg = ClientConfig::default().with_api_url(Some("http://127.0.0.1:9000/api".into()))?;
        assert_eq!(cfg.api.base_url, "http://127.0.0.1:9000/api");
        let untouched = ClientConfig::default().with_api_url(None)?;
        assert_eq!(untouched.api.base_url, DEFAULT_API_URL);
        Ok(())
    }
}
