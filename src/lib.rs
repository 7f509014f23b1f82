//! bbw: a terminal front-end for the Bitwarden CLI.

pub mod cli;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod interactive;
pub mod models;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use client::VaultClient;
pub use config::Config;
pub use error::{BbwError, Result};
pub use models::{Item, VaultStatus};
