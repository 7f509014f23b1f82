//! Persistent configuration: cached email, master password and session token.

use crate::error::{BbwError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Directory under the user's home holding the config file.
const CONFIG_DIR: &str = ".config/bbw";
const CONFIG_FILE: &str = "config.yaml";

/// Cached credentials, stored as a flat YAML record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Config {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub session: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("email", &self.email)
            .field("password", &redact(&self.password))
            .field("session", &redact(&self.session))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl Config {
    /// `$HOME/.config/bbw/config.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(BbwError::NoHomeDir)?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load the config at `path`, creating an empty file (and its directory)
    /// when it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(parent, fs::Permissions::from_mode(0o755))?;
                }
            }
        }

        if !path.exists() {
            tracing::debug!(path = %path.display(), "creating empty config file");
            write_private(path, "")
                .map_err(|e| BbwError::Other(format!("failed to create config file: {e}")))?;
        }

        let content = fs::read_to_string(path)
            .map_err(|e| BbwError::Other(format!("failed to read config: {e}")))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save the config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Write all three fields to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        write_private(path, &content)
            .map_err(|e| BbwError::Other(format!("failed to write config: {e}")))?;
        tracing::debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Whether a master password has been cached by a previous setup.
    pub fn is_configured(&self) -> bool {
        !self.password.is_empty()
    }
}

/// Write `content` to an owner-only file; it holds the master password.
///
/// `mode` only applies on creation, so an existing file is narrowed first.
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
    }

    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()
}
