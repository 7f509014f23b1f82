//! Error types for bbw.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bbw operations.
#[derive(Error, Debug)]
pub enum BbwError {
    #[error("Bitwarden CLI not found at '{0}'. Please install the bw CLI.")]
    BwNotFound(PathBuf),

    #[error("{context}: {stderr}")]
    CommandFailed { context: String, stderr: String },

    #[error("no session provided")]
    NoSession,

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Interactive mode requires a terminal")]
    NotATerminal,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{0}")]
    Other(String),
}

impl BbwError {
    /// Prefix an error with the operation that produced it.
    pub fn context(self, context: &str) -> Self {
        match self {
            BbwError::Other(msg) => BbwError::Other(format!("{context}: {msg}")),
            other => BbwError::Other(format!("{context}: {other}")),
        }
    }
}

impl From<dialoguer::Error> for BbwError {
    fn from(err: dialoguer::Error) -> Self {
        BbwError::Prompt(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BbwError>;
