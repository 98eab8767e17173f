use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::{Credentials, Password};
use crate::client::DEFAULT_HISTORY_LIMIT;
use crate::error::JenkinsError;

/// Configuration file structure.
///
/// Holds the server to talk to, which jobs to work on, and display
/// preferences. Every value can be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Server location and credentials
    #[serde(default)]
    pub server: ServerConfig,

    /// Jobs and views commands operate on
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Output preferences
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Jenkins base URI
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// User to log in as
    pub user: Option<String>,

    /// Password; the file must then be readable by its owner only
    pub password: Option<String>,

    /// Shell command printing the password on its first line
    pub password_command: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectionConfig {
    /// Job names
    #[serde(default)]
    pub jobs: Vec<String>,

    /// View names, nested views as `parent/child`
    #[serde(default)]
    pub views: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayConfig {
    /// Show successful jobs green instead of blue
    #[serde(default)]
    pub stoplight: bool,

    /// Force colors on or off; detected from the terminal when unset
    pub color: Option<bool>,

    /// Trace HTTP requests
    #[serde(default)]
    pub verbose: bool,

    /// Show stuck queue items
    #[serde(default)]
    pub stuck: bool,

    /// Act on several jobs without asking
    #[serde(default)]
    pub auto_confirm: bool,

    /// Number of builds `history` shows
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            user: None,
            password: None,
            password_command: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            stoplight: false,
            color: None,
            verbose: false,
            stuck: false,
            auto_confirm: false,
            history_limit: default_history_limit(),
        }
    }
}

fn default_base_uri() -> String {
    "http://localhost:8080/".to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Uses the given path, or else the first existing file of
    /// `<config_dir>/jenkins-cli/config.{toml,json,yaml,yml}`.
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let Some(dir) = dirs::config_dir() else {
            return Vec::new();
        };
        let dir = dir.join("jenkins-cli");

        ["config.toml", "config.json", "config.yaml", "config.yml"]
            .iter()
            .map(|name| dir.join(name))
            .collect()
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        if config.server.password.is_some() {
            ensure_private(path)?;
        }

        Ok(config)
    }
}

/// Refuses config files holding a password that others could read.
#[cfg(unix)]
fn ensure_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat config file: {}", path.display()))?
        .permissions()
        .mode();

    if mode & 0o077 != 0 {
        return Err(JenkinsError::InsecureConfig(path.to_path_buf()).into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_private(_path: &Path) -> Result<()> {
    Ok(())
}

/// Color output choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Color when writing to a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn apply(self) {
        match self {
            Self::Auto => {}
            Self::Always => {
                console::set_colors_enabled(true);
                console::set_colors_enabled_stderr(true);
            }
            Self::Never => {
                console::set_colors_enabled(false);
                console::set_colors_enabled_stderr(false);
            }
        }
    }
}

impl From<Option<bool>> for ColorChoice {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Auto,
            Some(true) => Self::Always,
            Some(false) => Self::Never,
        }
    }
}

/// Effective settings of one run: the config file with command-line
/// overrides applied. Read-only once built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_uri: String,
    pub credentials: Credentials,
    pub jobs: Vec<String>,
    pub views: Vec<String>,
    pub stoplight: bool,
    pub color: ColorChoice,
    pub verbose: bool,
    pub show_stuck: bool,
    pub auto_confirm: bool,
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(Config::default())
    }
}

impl From<Config> for Settings {
    fn from(config: Config) -> Self {
        let Config {
            server,
            selection,
            display,
        } = config;

        Self {
            base_uri: server.base_uri,
            credentials: Credentials {
                user: server.user,
                password: server.password.map(Password::from),
                password_command: server.password_command,
            },
            jobs: selection.jobs,
            views: selection.views,
            stoplight: display.stoplight,
            color: display.color.into(),
            verbose: display.verbose,
            show_stuck: display.stuck,
            auto_confirm: display.auto_confirm,
            history_limit: display.history_limit,
        }
    }
}
