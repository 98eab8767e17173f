use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use url::Url;

use crate::error::Result;

/// Per-user store of session cookies, keyed by server base URI.
///
/// Lives at `<cache_dir>/jenkins-cli/session.json` by default:
/// - Linux: `~/.cache/jenkins-cli/session.json`
/// - macOS: `~/Library/Caches/jenkins-cli/session.json`
///
/// Read once when the client is built and written after a login. There is no
/// locking between concurrent invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn default_location() -> Self {
        let path = dirs::cache_dir().map(|dir| dir.join("jenkins-cli").join("session.json"));
        if path.is_none() {
            warn!("No cache directory found, sessions will not be persisted");
        }
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A store that neither loads nor saves anything.
    pub fn ephemeral() -> Self {
        Self { path: None }
    }

    fn read_all(&self) -> HashMap<String, String> {
        let Some(path) = &self.path else {
            return HashMap::new();
        };
        if !path.exists() {
            return HashMap::new();
        }

        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .inspect(|_| debug!("Loaded sessions from: {}", path.display()))
            .unwrap_or_else(|| {
                warn!("Failed to load session file {}, ignoring it", path.display());
                HashMap::new()
            })
    }

    /// Cookie header stored for `base`, if any.
    pub fn load(&self, base: &Url) -> Option<String> {
        self.read_all().remove(base.as_str())
    }

    /// Stores `cookies` for `base`, keeping sessions of other servers.
    pub fn save(&self, base: &Url, cookies: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut sessions = self.read_all();
        sessions.insert(base.to_string(), cookies.to_string());

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = open_private(path)?;
        file.write_all(serde_json::to_string_pretty(&sessions)?.as_bytes())?;

        debug!("Saved session for {base} to {}", path.display());
        Ok(())
    }
}

/// Opens `path` for rewriting, readable by its owner only.
///
/// A new file is created with mode 0600; an existing one is tightened before
/// anything is written to it.
#[cfg(unix)]
fn open_private(path: &Path) -> Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}
