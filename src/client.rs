//! Bitwarden CLI integration.
//!
//! Every operation runs the `bw` binary once as a subprocess and waits for it.
//! Arguments are handed to the process as an argv list, never through a shell,
//! so search queries and item ids reach `bw` byte for byte. The session token
//! travels in the `BW_SESSION` environment variable of the child and master
//! passwords in `BW_PASSWORD`, keeping both out of the process list.

use crate::error::{BbwError, Result};
use crate::models::{Item, LockState, VaultStatus};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Binary looked up on `PATH` when no override is configured.
pub const DEFAULT_BINARY: &str = "bw";

/// Environment variable `bw` reads the session token from.
pub const SESSION_ENV: &str = "BW_SESSION";

/// Environment variable the master password is passed through.
pub const PASSWORD_ENV: &str = "BW_PASSWORD";

/// Default generated password length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 18;

/// Default number of passphrase words.
pub const DEFAULT_PASSPHRASE_WORDS: usize = 5;

/// Client for the Bitwarden CLI bound to one session token.
#[derive(Debug, Clone)]
pub struct VaultClient {
    binary: PathBuf,
    session: String,
}

impl VaultClient {
    /// Create a client using `bw` from `PATH`.
    pub fn new(session: impl Into<String>) -> Self {
        Self::with_binary(DEFAULT_BINARY, session)
    }

    /// Create a client running a specific `bw` executable.
    pub fn with_binary(binary: impl Into<PathBuf>, session: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            session: session.into(),
        }
    }

    /// Current session token; empty when none is held.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Log in with email and master password, returning the new session key.
    pub fn login(&mut self, email: &str, password: &str) -> Result<String> {
        let mut cmd = self.command(&login_args(email));
        cmd.env(PASSWORD_ENV, password);
        let session = self.run(cmd, "login failed")?.trim().to_string();
        self.session = session.clone();
        Ok(session)
    }

    /// Unlock the vault with the master password, returning the new session key.
    pub fn unlock(&mut self, password: &str) -> Result<String> {
        let mut cmd = self.command(&unlock_args());
        cmd.env(PASSWORD_ENV, password);
        let session = self.run(cmd, "unlock failed")?.trim().to_string();
        self.session = session.clone();
        Ok(session)
    }

    /// Detailed status information from `bw status`.
    pub fn status(&self) -> Result<VaultStatus> {
        let output = self.run(self.command(&["status"]), "status check failed")?;
        serde_json::from_str(&output).map_err(|source| BbwError::Json {
            context: "failed to parse status".to_string(),
            source,
        })
    }

    /// Check whether the held session still unlocks the vault.
    ///
    /// Any failure to run or parse `bw status` counts as invalid.
    pub fn validate_session(&self) -> bool {
        if self.session.is_empty() {
            return false;
        }
        match self.status() {
            Ok(status) => status.is_unlocked(),
            Err(e) => {
                tracing::debug!(error = %e, "session validation failed");
                false
            }
        }
    }

    /// Locked or unlocked, as far as this client's session goes.
    pub fn lock_state(&self) -> LockState {
        if self.validate_session() {
            LockState::Unlocked
        } else {
            LockState::Locked
        }
    }

    /// Search the vault for items matching `query`.
    pub fn search(&self, query: &str) -> Result<Vec<Item>> {
        if self.session.is_empty() {
            return Err(BbwError::NoSession);
        }

        let output = self.run(self.command(&search_args(query)), "search failed")?;
        serde_json::from_str(&output).map_err(|source| BbwError::Json {
            context: "failed to parse items".to_string(),
            source,
        })
    }

    /// Fetch the password of a single item by id or search term.
    pub fn get_password(&self, id: &str) -> Result<String> {
        if self.session.is_empty() {
            return Err(BbwError::NoSession);
        }

        let output = self.run(self.command(&get_password_args(id)), "password lookup failed")?;
        Ok(output.trim().to_string())
    }

    /// Generate a random password of `length` characters.
    pub fn generate_password(&self, length: usize, include_special: bool) -> Result<String> {
        let output = self.run(
            self.command(&generate_password_args(length, include_special)),
            "password generation failed",
        )?;
        Ok(output.trim().to_string())
    }

    /// Generate a passphrase of `words` words with no separator.
    pub fn generate_passphrase(&self, words: usize, include_number: bool) -> Result<String> {
        let output = self.run(
            self.command(&generate_passphrase_args(words, include_number)),
            "passphrase generation failed",
        )?;
        Ok(output.trim().to_string())
    }

    /// Pull the latest vault data from the server.
    pub fn sync(&self) -> Result<()> {
        self.run(self.command(&["sync"]), "sync failed")?;
        Ok(())
    }

    /// Ask `bw` whether a newer CLI release exists; returns its message.
    pub fn update(&self) -> Result<String> {
        let output = self.run(self.command(&["update"]), "update check failed")?;
        Ok(output.trim().to_string())
    }

    /// Build a command with the session environment applied.
    fn command<S: AsRef<str>>(&self, args: &[S]) -> Command {
        let mut cmd = Command::new(&self.binary);
        for arg in args {
            let arg: &str = arg.as_ref();
            cmd.arg(arg);
        }
        if self.session.is_empty() {
            cmd.env_remove(SESSION_ENV);
        } else {
            cmd.env(SESSION_ENV, &self.session);
        }
        cmd.env_remove(PASSWORD_ENV);
        if let Some(first) = args.first() {
            let subcommand: &str = first.as_ref();
            tracing::debug!(binary = %self.binary.display(), subcommand, "running bw");
        }
        cmd
    }

    /// Run to completion and return stdout, mapping failures to errors
    /// prefixed with `context`.
    fn run(&self, mut cmd: Command, context: &str) -> Result<String> {
        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => BbwError::BwNotFound(self.binary.clone()),
            _ => BbwError::Other(format!("{context}: {e}")),
        })?;

        if !output.status.success() {
            return Err(BbwError::CommandFailed {
                context: context.to_string(),
                stderr: failure_message(&output),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Best description of a failed run: stderr, else stdout, else the exit status.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    output.status.to_string()
}

pub fn login_args(email: &str) -> Vec<String> {
    vec![
        "login".to_string(),
        email.to_string(),
        "--passwordenv".to_string(),
        PASSWORD_ENV.to_string(),
        "--raw".to_string(),
    ]
}

pub fn unlock_args() -> Vec<String> {
    vec![
        "unlock".to_string(),
        "--passwordenv".to_string(),
        PASSWORD_ENV.to_string(),
        "--raw".to_string(),
    ]
}

/// `list items --search <query> --raw`, with the query as a single argument.
pub fn search_args(query: &str) -> Vec<String> {
    vec![
        "list".to_string(),
        "items".to_string(),
        "--search".to_string(),
        query.to_string(),
        "--raw".to_string(),
    ]
}

pub fn get_password_args(id: &str) -> Vec<String> {
    vec![
        "get".to_string(),
        "password".to_string(),
        id.to_string(),
        "--raw".to_string(),
    ]
}

/// With special characters: lower, upper, special and numbers with at least
/// two of each of the last two. Without: lower, upper and at least two numbers.
pub fn generate_password_args(length: usize, include_special: bool) -> Vec<String> {
    let mut args = vec![
        "generate".to_string(),
        "--length".to_string(),
        length.to_string(),
    ];
    if include_special {
        args.extend(
            ["-lusn", "--minSpecial", "2", "--minNumber", "2"]
                .iter()
                .map(|s| s.to_string()),
        );
    } else {
        args.extend(["-lun", "--minNumber", "2"].iter().map(|s| s.to_string()));
    }
    args
}

pub fn generate_passphrase_args(words: usize, include_number: bool) -> Vec<String> {
    let mut args = vec![
        "generate".to_string(),
        "--passphrase".to_string(),
        "--words".to_string(),
        words.to_string(),
        "--separator".to_string(),
        "empty".to_string(),
    ];
    if include_number {
        args.push("--includeNumber".to_string());
    }
    args
}
