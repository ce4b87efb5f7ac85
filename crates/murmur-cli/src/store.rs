//! JSON-file name store.
//!
//! The saved display name lives in `identity.json` under the platform config
//! directory (or wherever `--state-file` points). The shared secret is never
//! written to disk.

use std::{
    fs,
    path::{Path, PathBuf},
};

use murmur_client::{IdentityError, NameStore};

/// Directory under the platform config dir.
const APP_DIR_NAME: &str = "murmur";

/// State file name.
const STATE_FILE_NAME: &str = "identity.json";

/// File permissions for the state file on Unix (owner read/write only)
#[cfg(unix)]
const STATE_FILE_MODE: u32 = 0o600;

/// On-disk layout.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct StateFile {
    #[serde(default)]
    username: Option<String>,
}

/// [`NameStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonNameStore {
    path: PathBuf,
}

impl JsonNameStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform default location, `None` if there is no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(STATE_FILE_NAME))
    }
}

impl NameStore for JsonNameStore {
    /// A missing file is "no saved name"; an unreadable or corrupt one is an
    /// error so that a typo in the file never silently drops the name.
    fn load(&self) -> Result<Option<String>, IdentityError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(storage)?;
        let state: StateFile = serde_json::from_str(&contents).map_err(storage)?;
        Ok(state.username)
    }

    fn save(&mut self, name: &str) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage)?;
        }

        let state = StateFile { username: Some(name.to_owned()) };
        let json = serde_json::to_string_pretty(&state).map_err(storage)?;
        fs::write(&self.path, json).map_err(storage)?;

        #[cfg(unix)]
        set_owner_only(&self.path)?;

        tracing::debug!(path = %self.path.display(), "saved display name");
        Ok(())
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<(), IdentityError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(STATE_FILE_MODE)).map_err(storage)
}

fn storage(error: impl std::fmt::Display) -> IdentityError {
    IdentityError::Storage(error.to_string())
}
