//! Startup: obtain a client holding a valid session.
//!
//! A cached session is reused when `bw status` still reports the vault as
//! unlocked. Otherwise the vault is unlocked with the cached master password,
//! or, on first run, the user is asked for email and master password.

use crate::client::VaultClient;
use crate::config::Config;
use crate::error::{BbwError, Result};
use crate::utils::info;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use std::path::PathBuf;
use zeroize::Zeroize;

/// Establishes sessions and persists them to the config file.
pub struct SessionManager {
    binary: PathBuf,
    config_path: PathBuf,
}

impl SessionManager {
    pub fn new(binary: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config_path: config_path.into(),
        }
    }

    /// Client bound to whatever session is cached, without validating it.
    pub fn cached_client(&self, config: &Config) -> VaultClient {
        VaultClient::with_binary(&self.binary, config.session.clone())
    }

    /// Return a client with a usable session, unlocking or running first-time
    /// setup as needed. `config` is updated and saved when the session changes.
    pub fn establish(&self, config: &mut Config) -> Result<VaultClient> {
        let client = self.cached_client(config);
        if client.validate_session() {
            tracing::debug!("reusing cached session");
            return Ok(client);
        }

        if !config.is_configured() {
            let (email, mut password) = prompt_credentials().map_err(|e| e.context("Setup failed"))?;
            let result = self.first_time_setup(config, &email, &password);
            password.zeroize();
            return result.map_err(|e| e.context("Setup failed"));
        }

        tracing::debug!("cached session invalid, unlocking");
        let mut client = client;
        let session = client
            .unlock(&config.password)
            .map_err(|e| e.context("Failed to unlock vault"))?;
        config.session = session;
        config
            .save_to(&self.config_path)
            .map_err(|e| e.context("Failed to save config"))?;
        Ok(client)
    }

    /// Log in (or unlock, when `bw` is already logged in as `email`) and
    /// cache all three credentials.
    pub fn first_time_setup(
        &self,
        config: &mut Config,
        email: &str,
        password: &str,
    ) -> Result<VaultClient> {
        let mut client = VaultClient::with_binary(&self.binary, "");

        let status = client.status()?;
        let session = if status.is_logged_in_as(email) {
            tracing::debug!("already logged in, unlocking");
            client.unlock(password)?
        } else {
            client.login(email, password)?
        };

        config.email = email.to_string();
        config.password = password.to_string();
        config.session = session;
        config.save_to(&self.config_path)?;
        Ok(client)
    }
}

/// Ask for email and master password on the terminal.
fn prompt_credentials() -> Result<(String, String)> {
    info("First time setup");
    let theme = ColorfulTheme::default();

    let email: String = Input::with_theme(&theme)
        .with_prompt("Enter your Bitwarden email")
        .interact_text()?;

    let password = Password::with_theme(&theme)
        .with_prompt("Enter your master password")
        .interact()?;

    if password.is_empty() {
        return Err(BbwError::Cancelled);
    }

    Ok((email.trim().to_string(), password))
}
