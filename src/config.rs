//! Configuration file handling for Eventory.
//!
//! The configuration file is stored at `$EVENTORY_HOME/config.json`. It holds the backend's base
//! URL, the request timeout and, optionally, where the session token file lives.

use crate::error::{ErrorType, IntoResult, Res, Result};
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "eventory";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const EXPORTS: &str = "exports";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// The backend used when `init` is not given one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EVENTORY_HOME` and from there it loads `$EVENTORY_HOME/config.json`. It provides
/// paths to the other items that live in the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    exports: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    base_url: Url,
}

impl Config {
    /// Creates the home directory and its subdirectories, and writes an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/eventory`
    /// - `base_url` - The backend's base URL. `DEFAULT_BASE_URL` when `None`.
    pub async fn create(dir: impl Into<PathBuf>, base_url: Option<&str>) -> Result<Self> {
        Self::create_inner(dir.into(), base_url)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, base_url: Option<&str>) -> Res<Self> {
        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_BASE_URL))?;

        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the eventory home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        let exports = root.join(EXPORTS);
        utils::make_dir(&exports).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            base_url: base_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            exports,
            config_path,
            config_file,
            base_url,
        })
    }

    /// This will
    /// - validate that `eventory_home` and its config file exist
    /// - load and validate the config file
    /// - validate that the secrets and exports directories exist
    pub async fn load(eventory_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(eventory_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The eventory home directory is missing, run 'eventory init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let base_url = parse_base_url(&config_file.base_url)?;

        let config = Self {
            secrets: root.join(SECRETS),
            exports: root.join(EXPORTS),
            root,
            config_path,
            config_file,
            base_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        if !config.exports.is_dir() {
            bail!(
                "The exports directory is missing '{}'",
                config.exports.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// Where exported documents are written unless another directory is given.
    pub fn exports(&self) -> &Path {
        &self.exports
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.timeout_secs)
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

fn parse_base_url(s: &str) -> Res<Url> {
    let url = Url::parse(s).with_context(|| format!("Invalid base URL '{s}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("The base URL must use http or https, got '{other}'"),
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "eventory",
///   "config_version": 1,
///   "base_url": "http://localhost:5000/api",
///   "timeout_secs": 30,
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "eventory"
    app_name: String,

    config_version: u8,

    /// The REST backend, e.g. `http://localhost:5000/api`
    base_url: String,

    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// Path to the session token file (optional, relative to the home directory or absolute).
    /// Defaults to $EVENTORY_HOME/.secrets/token.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and checks its `app_name`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}
