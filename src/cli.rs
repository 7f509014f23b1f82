//! Command-line interface implementation.

use crate::client::{
    VaultClient, DEFAULT_BINARY, DEFAULT_PASSPHRASE_WORDS, DEFAULT_PASSWORD_LENGTH,
};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Config;
use crate::error::{BbwError, Result};
use crate::interactive::SearchUi;
use crate::session::SessionManager;
use crate::utils::{info, success, warning, with_spinner};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use zeroize::Zeroize;

/// Better Bitwarden: search your vault and copy credentials from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(
        long,
        global = true,
        env = "BBW_CONFIG",
        help = "Path to config file (default: ~/.config/bbw/config.yaml)"
    )]
    pub config: Option<PathBuf>,

    /// Bitwarden CLI executable
    #[arg(long = "bw", global = true, env = "BBW_BW_PATH", default_value = DEFAULT_BINARY)]
    pub bw: PathBuf,

    /// Increase diagnostic output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the vault and list matching items
    Search {
        /// Search query
        query: String,

        /// Print the raw items as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print or copy the password of one item
    Get {
        /// Item id or exact name
        id: String,

        /// Copy to clipboard instead of printing
        #[arg(short, long)]
        clipboard: bool,
    },

    /// Generate a password or passphrase
    Generate {
        /// Generate a passphrase instead of a password
        #[arg(short, long)]
        passphrase: bool,

        /// Password length
        #[arg(short, long, default_value_t = DEFAULT_PASSWORD_LENGTH)]
        length: usize,

        /// Leave out special characters
        #[arg(long)]
        no_special: bool,

        /// Number of passphrase words
        #[arg(short, long, default_value_t = DEFAULT_PASSPHRASE_WORDS)]
        words: usize,

        /// Copy to clipboard instead of printing
        #[arg(short, long)]
        clipboard: bool,
    },

    /// Show vault status
    Status,

    /// Sync the vault with the server
    Sync,

    /// Check for a newer Bitwarden CLI release
    Update,
}

impl Cli {
    /// Config path from the flag/env, or the default location.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::default_path(),
        }
    }

    /// Execute the CLI command.
    pub fn execute(&self) -> Result<()> {
        let config_path = self.config_path()?;
        let mut config =
            Config::load_from(&config_path).map_err(|e| e.context("Failed to load config"))?;
        let sessions = SessionManager::new(&self.bw, config_path);

        match &self.command {
            None => self.run_interactive(&sessions, &mut config),
            Some(Commands::Search { query, json }) => {
                let client = sessions.establish(&mut config)?;
                self.search(&client, query, *json)
            }
            Some(Commands::Get { id, clipboard }) => {
                let client = sessions.establish(&mut config)?;
                self.get_password(&client, id, *clipboard)
            }
            Some(Commands::Generate {
                passphrase,
                length,
                no_special,
                words,
                clipboard,
            }) => {
                let client = sessions.cached_client(&config);
                let secret = if *passphrase {
                    client.generate_passphrase(*words, true)?
                } else {
                    client.generate_password(*length, !*no_special)?
                };
                self.emit_secret(secret, *clipboard, "Generated secret")
            }
            Some(Commands::Status) => {
                let status = sessions.cached_client(&config).status()?;
                for line in status.summary_lines() {
                    println!("{line}");
                }
                Ok(())
            }
            Some(Commands::Sync) => {
                let client = sessions.establish(&mut config)?;
                with_spinner("Syncing vault...", || client.sync())?;
                success("Vault synced successfully!");
                Ok(())
            }
            Some(Commands::Update) => {
                let client = sessions.cached_client(&config);
                let message = with_spinner("Checking for updates...", || client.update())?;
                if message.is_empty() {
                    info("No update information returned");
                } else {
                    println!("{message}");
                }
                Ok(())
            }
        }
    }

    fn run_interactive(&self, sessions: &SessionManager, config: &mut Config) -> Result<()> {
        if !atty::is(atty::Stream::Stdin) || !atty::is(atty::Stream::Stdout) {
            return Err(BbwError::NotATerminal);
        }

        let client = sessions.establish(config)?;
        let mut ui = SearchUi::new(client, Box::new(SystemClipboard::new()))?;
        ui.run()
    }

    fn search(&self, client: &VaultClient, query: &str, json: bool) -> Result<()> {
        let items = client.search(query)?;

        if json {
            let output = serde_json::to_string_pretty(&items).map_err(|source| BbwError::Json {
                context: "failed to serialize items".to_string(),
                source,
            })?;
            println!("{output}");
            return Ok(());
        }

        if items.is_empty() {
            warning("No items found");
            return Ok(());
        }

        for item in &items {
            println!("{}  {}", item.id.dimmed(), item.display_string());
        }
        Ok(())
    }

    fn get_password(&self, client: &VaultClient, id: &str, clipboard: bool) -> Result<()> {
        let password = client.get_password(id)?;
        self.emit_secret(password, clipboard, &format!("Password for {id}"))
    }

    /// Print `secret`, or copy it when `clipboard` is set, then wipe it.
    fn emit_secret(&self, mut secret: String, clipboard: bool, label: &str) -> Result<()> {
        let result = if clipboard {
            SystemClipboard::new()
                .write_all(&secret)
                .map(|()| success(&format!("{label} copied to clipboard!")))
        } else {
            println!("{secret}");
            Ok(())
        };
        secret.zeroize();
        result
    }
}
