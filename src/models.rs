//! Data models for items and status reported by the Bitwarden CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single vault entry, as emitted by `bw list items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub revision_date: Option<String>,
    /// Most recent first
    #[serde(default, deserialize_with = "null_as_default")]
    pub password_history: Vec<PasswordHistoryEntry>,
    /// Absent for secure notes
    #[serde(default)]
    pub login: Option<Login>,
}

/// A previously used password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHistoryEntry {
    #[serde(default)]
    pub last_used_date: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login credentials attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_revision_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uris: Vec<LoginUri>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginUri {
    #[serde(default)]
    pub uri: Option<String>,
}

/// `bw` writes `null` for empty collections.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Item {
    /// Login username, or an empty string.
    pub fn username(&self) -> &str {
        self.login
            .as_ref()
            .and_then(|l| non_empty(&l.username))
            .unwrap_or("")
    }

    /// Login password, or an empty string.
    pub fn password(&self) -> &str {
        self.login
            .as_ref()
            .and_then(|l| non_empty(&l.password))
            .unwrap_or("")
    }

    pub fn notes(&self) -> &str {
        non_empty(&self.notes).unwrap_or("")
    }

    /// First URI attached to the login, if it is non-empty.
    pub fn primary_uri(&self) -> Option<&str> {
        self.login
            .as_ref()
            .and_then(|l| l.uris.first())
            .and_then(|u| non_empty(&u.uri))
    }

    /// True for secure notes: notes but no login credentials.
    pub fn is_note(&self) -> bool {
        !self.notes().is_empty() && self.username().is_empty() && self.password().is_empty()
    }

    /// Label shown in the selection list.
    ///
    /// `"<name> (Note)"` for secure notes, `"<name> (<username>)"` for logins
    /// with a username, and the bare name otherwise.
    pub fn display_string(&self) -> String {
        if self.is_note() {
            format!("{} (Note)", self.name)
        } else if !self.username().is_empty() {
            format!("{} ({})", self.name, self.username())
        } else {
            self.name.clone()
        }
    }

    /// Newline-terminated metadata block: dates and the primary URI.
    pub fn metadata(&self) -> String {
        let mut metadata = String::new();
        metadata.push_str(&format!(
            "Created: {}\n",
            format_timestamp(self.creation_date.as_deref().unwrap_or(""))
        ));
        metadata.push_str(&format!(
            "Last Modified: {}\n",
            format_timestamp(self.revision_date.as_deref().unwrap_or(""))
        ));

        if let Some(date) = self
            .login
            .as_ref()
            .and_then(|l| non_empty(&l.password_revision_date))
        {
            metadata.push_str(&format!(
                "Password Last Modified: {}\n",
                format_timestamp(date)
            ));
        }

        if let Some(date) = self
            .password_history
            .first()
            .and_then(|h| non_empty(&h.last_used_date))
        {
            metadata.push_str(&format!("Password Last Used: {}\n", format_timestamp(date)));
        }

        match self.primary_uri() {
            Some(uri) => metadata.push_str(&format!("URI: {uri}\n")),
            None => metadata.push_str("URI: No URI available\n"),
        }

        metadata
    }
}

/// Render an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS UTC`; anything else
/// is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Lock state reported by `bw status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unauthenticated,
    Locked,
    Unlocked,
    Unknown,
}

impl LockState {
    pub fn parse(status: &str) -> Self {
        match status {
            "unauthenticated" => LockState::Unauthenticated,
            "locked" => LockState::Locked,
            "unlocked" => LockState::Unlocked,
            _ => LockState::Unknown,
        }
    }
}

/// Output of `bw status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultStatus {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl VaultStatus {
    pub fn lock_state(&self) -> LockState {
        LockState::parse(&self.status)
    }

    pub fn is_unlocked(&self) -> bool {
        self.lock_state() == LockState::Unlocked
    }

    /// Whether the CLI is logged in as `email`.
    pub fn is_logged_in_as(&self, email: &str) -> bool {
        self.user_email.as_deref() == Some(email)
    }

    /// One `Label: value` line per field, status last.
    pub fn summary_lines(&self) -> Vec<String> {
        let show = |v: &Option<String>| v.as_deref().unwrap_or("unknown").to_string();
        vec![
            format!("Server URL: {}", show(&self.server_url)),
            format!(
                "Last Sync: {}",
                self.last_sync
                    .as_deref()
                    .map(format_timestamp)
                    .unwrap_or_else(|| "never".to_string())
            ),
            format!("Email: {}", show(&self.user_email)),
            format!("User ID: {}", show(&self.user_id)),
            format!(
                "Status: {}",
                if self.status.is_empty() {
                    "unknown"
                } else {
                    self.status.as_str()
                }
            ),
        ]
    }
}
