use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JenkinsError {
    #[error("API request to {url} failed with status {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No jobs match pattern '{0}'")]
    NoMatches(String),

    #[error("'{}' needs exactly one job, but the pattern matched: {}", .command, .matches.join(", "))]
    Ambiguous {
        command: String,
        matches: Vec<String>,
    },

    #[error("Job '{0}' has never been built")]
    NeverBuilt(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error(
        "Config file {} embeds a password but is accessible by group or others; run `chmod 600` on it",
        .0.display()
    )]
    InsecureConfig(PathBuf),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JenkinsError>;
