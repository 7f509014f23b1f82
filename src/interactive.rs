//! Interactive search loop.

use crate::client::{VaultClient, DEFAULT_PASSPHRASE_WORDS, DEFAULT_PASSWORD_LENGTH};
use crate::clipboard::Clipboard;
use crate::error::{BbwError, Result};
use crate::models::Item;
use crate::utils::{self, info, success, warning, with_spinner};
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use zeroize::Zeroize;

/// Label of the entry that leaves a menu without doing anything.
pub const CANCEL: &str = "Cancel";

const COMMAND_HINT: &str = "g - generate | h - help | s - status | u - update | q - quit";

/// What a line typed at the search prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Quit,
    Help,
    Generate,
    Status,
    Update,
    Empty,
    Search(String),
}

impl PromptCommand {
    /// Commands match the whole line; anything else is searched for as typed.
    pub fn parse(input: &str) -> Self {
        match input {
            "q" => PromptCommand::Quit,
            "h" => PromptCommand::Help,
            "g" => PromptCommand::Generate,
            "s" => PromptCommand::Status,
            "u" => PromptCommand::Update,
            "" => PromptCommand::Empty,
            _ => PromptCommand::Search(input.to_string()),
        }
    }
}

/// Labels for the item selection list, `Cancel` last.
pub fn selection_labels(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(Item::display_string)
        .chain(std::iter::once(CANCEL.to_string()))
        .collect()
}

/// Item picked from the selection list; `None` for `Cancel` or escape.
pub fn resolve_selection(items: &[Item], choice: Option<usize>) -> Option<&Item> {
    choice.and_then(|index| items.get(index))
}

/// Something that can be done with a selected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    CopyUsername,
    CopyPassword,
    CopyNotes,
    CopyUrl,
    ShowMetadata,
    Cancel,
}

/// Action menu for `item`, paired with the label shown for each entry.
pub fn item_actions(item: &Item) -> Vec<(String, ItemAction)> {
    let mut actions = vec![
        (
            format!("Username: {}", item.username()),
            ItemAction::CopyUsername,
        ),
        (
            format!("Password: {}", mask(item.password())),
            ItemAction::CopyPassword,
        ),
    ];
    if !item.notes().is_empty() {
        actions.push((format!("Notes: {}", item.notes()), ItemAction::CopyNotes));
    }
    let url_label = match item.primary_uri() {
        Some(uri) => format!("URL: {uri}"),
        None => "URL: No URI available".to_string(),
    };
    actions.push((url_label, ItemAction::CopyUrl));
    actions.push(("Show Metadata".to_string(), ItemAction::ShowMetadata));
    actions.push((CANCEL.to_string(), ItemAction::Cancel));
    actions
}

fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count().min(12))
}

/// Result of applying an [`ItemAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The named field was written to the clipboard
    Copied(&'static str),
    NoUri,
    /// Metadata to show; copying it needs confirmation
    Metadata(String),
    Cancelled,
}

/// Perform `action` on `item`. Only the copy actions touch the clipboard.
pub fn apply_action(
    item: &Item,
    action: ItemAction,
    clipboard: &mut dyn Clipboard,
) -> Result<ActionOutcome> {
    let (field, value) = match action {
        ItemAction::CopyUsername => ("Username", item.username()),
        ItemAction::CopyPassword => ("Password", item.password()),
        ItemAction::CopyNotes => ("Notes", item.notes()),
        ItemAction::CopyUrl => match item.primary_uri() {
            Some(uri) => ("URL", uri),
            None => return Ok(ActionOutcome::NoUri),
        },
        ItemAction::ShowMetadata => return Ok(ActionOutcome::Metadata(item.metadata())),
        ItemAction::Cancel => return Ok(ActionOutcome::Cancelled),
    };

    clipboard
        .write_all(value)
        .map_err(|e| e.context(&format!("failed to copy {}", field.to_lowercase())))?;
    Ok(ActionOutcome::Copied(field))
}

/// Generator menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorChoice {
    PasswordWithSpecial,
    PasswordWithoutSpecial,
    Passphrase,
    Cancel,
}

impl GeneratorChoice {
    pub const ALL: [GeneratorChoice; 4] = [
        GeneratorChoice::PasswordWithSpecial,
        GeneratorChoice::PasswordWithoutSpecial,
        GeneratorChoice::Passphrase,
        GeneratorChoice::Cancel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GeneratorChoice::PasswordWithSpecial => {
                "Password with Special (-lusn --length 18 --minSpecial 2 --minNumber 2)"
            }
            GeneratorChoice::PasswordWithoutSpecial => {
                "Password without Special (-lun --length 18 --minNumber 2)"
            }
            GeneratorChoice::Passphrase => "Passphrase (5 words 1 number)",
            GeneratorChoice::Cancel => CANCEL,
        }
    }

    /// "Password" or "Passphrase"; `None` for `Cancel`.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            GeneratorChoice::PasswordWithSpecial | GeneratorChoice::PasswordWithoutSpecial => {
                Some("Password")
            }
            GeneratorChoice::Passphrase => Some("Passphrase"),
            GeneratorChoice::Cancel => None,
        }
    }
}

/// Generate a secret for `choice` and copy it. Returns the secret, or `None`
/// for `Cancel`, in which case neither `bw` nor the clipboard is touched.
pub fn generate_and_copy(
    client: &VaultClient,
    choice: GeneratorChoice,
    clipboard: &mut dyn Clipboard,
) -> Result<Option<String>> {
    let secret = match choice {
        GeneratorChoice::PasswordWithSpecial => {
            client.generate_password(DEFAULT_PASSWORD_LENGTH, true)?
        }
        GeneratorChoice::PasswordWithoutSpecial => {
            client.generate_password(DEFAULT_PASSWORD_LENGTH, false)?
        }
        GeneratorChoice::Passphrase => {
            client.generate_passphrase(DEFAULT_PASSPHRASE_WORDS, true)?
        }
        GeneratorChoice::Cancel => return Ok(None),
    };

    if let Err(e) = clipboard.write_all(&secret) {
        let mut secret = secret;
        secret.zeroize();
        return Err(e.context("failed to copy generated secret"));
    }
    Ok(Some(secret))
}

/// Copy `metadata` if the user confirmed it. Returns whether it was copied.
pub fn copy_metadata_if_confirmed(
    metadata: &str,
    confirmed: bool,
    clipboard: &mut dyn Clipboard,
) -> Result<bool> {
    if !confirmed {
        return Ok(false);
    }
    clipboard
        .write_all(metadata)
        .map_err(|e| e.context("failed to copy metadata"))?;
    Ok(true)
}

/// Check for a `bw` update, then sync. Sync runs even when the update check
/// fails; both results are returned for the caller to report.
pub fn update_then_sync(client: &VaultClient) -> (Result<String>, Result<()>) {
    let update = with_spinner("Checking for updates...", || client.update());
    let sync = with_spinner("Syncing vault...", || client.sync());
    (update, sync)
}

/// The search-and-copy shell.
pub struct SearchUi {
    client: VaultClient,
    clipboard: Box<dyn Clipboard>,
    editor: DefaultEditor,
    theme: ColorfulTheme,
}

impl SearchUi {
    pub fn new(client: VaultClient, clipboard: Box<dyn Clipboard>) -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| BbwError::Other(format!("Failed to create editor: {e}")))?;

        Ok(Self {
            client,
            clipboard,
            editor,
            theme: ColorfulTheme::default(),
        })
    }

    /// Run until the user quits. Search and selection failures end the loop.
    pub fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            let prompt = format!("{} ", "Search:".magenta());
            let line = match self.editor.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("Type 'q' to quit");
                    continue;
                }
                Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(BbwError::Other(format!("failed to get search input: {e}"))),
            };

            let command = PromptCommand::parse(&line);
            if let PromptCommand::Search(query) = &command {
                let _ = self.editor.add_history_entry(query.as_str());
            }

            match command {
                PromptCommand::Quit => return Ok(()),
                PromptCommand::Help => self.show_help(),
                PromptCommand::Generate => {
                    if let Err(e) = self.show_generator() {
                        warning(&format!("Generation failed: {e}"));
                    }
                }
                PromptCommand::Status => self.show_status(),
                PromptCommand::Update => self.update_and_sync(),
                PromptCommand::Empty => {}
                PromptCommand::Search(query) => self.search(&query)?,
            }
        }
    }

    fn search(&mut self, query: &str) -> Result<()> {
        let items = with_spinner("Searching vault...", || self.client.search(query))?;

        if items.is_empty() {
            warning("No items found");
            return Ok(());
        }

        let labels = selection_labels(&items);
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Select item (↑/↓ arrows to move, enter to select)")
            .items(&labels)
            .default(0)
            .max_length(15)
            .interact_opt()?;

        match resolve_selection(&items, choice) {
            Some(item) => self
                .handle_item(item)
                .map_err(|e| e.context("error handling item selection")),
            None => Ok(()),
        }
    }

    fn handle_item(&mut self, item: &Item) -> Result<()> {
        let actions = item_actions(item);
        let labels: Vec<&str> = actions.iter().map(|(label, _)| label.as_str()).collect();

        let choice = Select::with_theme(&self.theme)
            .with_prompt("Select action to copy to clipboard")
            .items(&labels)
            .default(0)
            .max_length(25)
            .interact_opt()
            .map_err(|e| BbwError::Prompt(format!("failed to get action: {e}")))?;

        let action = match choice {
            Some(index) => actions[index].1,
            None => ItemAction::Cancel,
        };

        match apply_action(item, action, self.clipboard.as_mut())? {
            ActionOutcome::Copied(field) => {
                success(&format!("{field} for {} copied to clipboard!", item.name));
            }
            ActionOutcome::NoUri => info("No URI available to copy"),
            ActionOutcome::Metadata(metadata) => {
                info(&format!("Metadata for {}", item.name));
                println!("{metadata}");

                let confirmed = Confirm::with_theme(&self.theme)
                    .with_prompt("Copy metadata to clipboard?")
                    .default(false)
                    .interact_opt()?
                    .unwrap_or(false);
                if copy_metadata_if_confirmed(&metadata, confirmed, self.clipboard.as_mut())? {
                    success(&format!("Metadata for {} copied to clipboard!", item.name));
                }
            }
            ActionOutcome::Cancelled => {}
        }

        Ok(())
    }

    fn show_generator(&mut self) -> Result<()> {
        let labels: Vec<&str> = GeneratorChoice::ALL.iter().map(|c| c.label()).collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Select generator type")
            .items(&labels)
            .default(0)
            .interact_opt()?;

        let choice = choice
            .map(|index| GeneratorChoice::ALL[index])
            .unwrap_or(GeneratorChoice::Cancel);

        if let Some(mut secret) =
            generate_and_copy(&self.client, choice, self.clipboard.as_mut())?
        {
            let kind = choice.kind().unwrap_or("Password");
            success(&format!("Generated {}: {}", kind.to_lowercase(), secret));
            success(&format!("{kind} copied to clipboard!"));
            secret.zeroize();
        }
        Ok(())
    }

    fn show_status(&self) {
        match self.client.status() {
            Ok(status) => utils::print_box(Some("Vault Status"), &status.summary_lines()),
            Err(e) => warning(&format!("Failed to get status: {e}")),
        }
    }

    fn update_and_sync(&self) {
        info("Checking for updates and syncing vault...");
        let (update, sync) = update_then_sync(&self.client);
        match update {
            Ok(message) if !message.is_empty() => info(&message),
            Ok(_) => {}
            Err(e) => warning(&format!("Update check failed: {e}")),
        }
        match sync {
            Ok(()) => success("Vault synced successfully!"),
            Err(e) => warning(&format!("Sync failed: {e}")),
        }
    }

    fn show_help(&self) {
        let lines: Vec<String> = [
            "Commands:",
            "",
            "g - Generate password/passphrase",
            "h - Show this help",
            "s - Show vault status",
            "u - Update CLI and sync vault",
            "q - Quit",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        utils::print_box(Some("Help"), &lines);
    }

    fn print_welcome(&self) {
        println!();
        utils::print_box(None, &["Better Bitwarden".to_string()]);
        println!("{}", COMMAND_HINT.dimmed());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Login, LoginUri};

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Vec<String>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_all(&mut self, text: &str) -> Result<()> {
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    fn sample_item() -> Item {
        Item {
            id: "id-1".to_string(),
            name: "GitHub".to_string(),
            notes: Some("2fa codes in drawer".to_string()),
            login: Some(Login {
                username: Some("octocat".to_string()),
                password: Some("hunter2".to_string()),
                uris: vec![LoginUri {
                    uri: Some("https://github.com".to_string()),
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_commands() {
        assert_eq!(PromptCommand::parse("q"), PromptCommand::Quit);
        assert_eq!(PromptCommand::parse("h"), PromptCommand::Help);
        assert_eq!(PromptCommand::parse("g"), PromptCommand::Generate);
        assert_eq!(PromptCommand::parse("s"), PromptCommand::Status);
        assert_eq!(PromptCommand::parse("u"), PromptCommand::Update);
        assert_eq!(PromptCommand::parse(""), PromptCommand::Empty);
        assert_eq!(
            PromptCommand::parse("github"),
            PromptCommand::Search("github".to_string())
        );
        assert_eq!(
            PromptCommand::parse("quit"),
            PromptCommand::Search("quit".to_string())
        );
    }

    #[test]
    fn test_search_query_kept_as_typed() {
        assert_eq!(
            PromptCommand::parse("  my bank "),
            PromptCommand::Search("  my bank ".to_string())
        );
        assert_eq!(
            PromptCommand::parse(" q"),
            PromptCommand::Search(" q".to_string())
        );
        assert_eq!(
            PromptCommand::parse("  "),
            PromptCommand::Search("  ".to_string())
        );
    }

    #[test]
    fn test_selection_labels_end_with_cancel() {
        let items = vec![sample_item()];
        assert_eq!(selection_labels(&items), vec!["GitHub (octocat)", "Cancel"]);
    }

    #[test]
    fn test_cancel_selection_resolves_to_nothing() {
        let items = vec![sample_item(), sample_item()];
        assert!(resolve_selection(&items, Some(items.len())).is_none());
        assert!(resolve_selection(&items, None).is_none());
        assert!(resolve_selection(&items, Some(1)).is_some());
    }

    #[test]
    fn test_duplicate_labels_resolve_by_position() {
        let mut second = sample_item();
        second.id = "id-2".to_string();
        let items = vec![sample_item(), second];
        assert_eq!(resolve_selection(&items, Some(1)).unwrap().id, "id-2");
    }

    #[test]
    fn test_item_actions_layout() {
        let labels: Vec<String> = item_actions(&sample_item())
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "Username: octocat",
                "Password: •••••••",
                "Notes: 2fa codes in drawer",
                "URL: https://github.com",
                "Show Metadata",
                "Cancel",
            ]
        );
    }

    #[test]
    fn test_item_actions_without_notes_or_uri() {
        let mut item = sample_item();
        item.notes = None;
        item.login.as_mut().unwrap().uris.clear();
        let actions = item_actions(&item);
        assert!(!actions.iter().any(|(_, a)| *a == ItemAction::CopyNotes));
        assert!(actions
            .iter()
            .any(|(label, _)| label == "URL: No URI available"));
    }

    #[test]
    fn test_copy_actions_write_clipboard() {
        let item = sample_item();
        let mut clipboard = RecordingClipboard::default();

        let outcome = apply_action(&item, ItemAction::CopyPassword, &mut clipboard).unwrap();
        assert_eq!(outcome, ActionOutcome::Copied("Password"));
        apply_action(&item, ItemAction::CopyUsername, &mut clipboard).unwrap();
        apply_action(&item, ItemAction::CopyNotes, &mut clipboard).unwrap();
        apply_action(&item, ItemAction::CopyUrl, &mut clipboard).unwrap();

        assert_eq!(
            clipboard.writes,
            vec![
                "hunter2",
                "octocat",
                "2fa codes in drawer",
                "https://github.com"
            ]
        );
    }

    #[test]
    fn test_cancel_action_never_writes_clipboard() {
        let mut clipboard = RecordingClipboard::default();
        let outcome = apply_action(&sample_item(), ItemAction::Cancel, &mut clipboard).unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert!(clipboard.writes.is_empty());
    }

    #[test]
    fn test_url_without_uri_is_not_copied() {
        let mut item = sample_item();
        item.login.as_mut().unwrap().uris.clear();
        let mut clipboard = RecordingClipboard::default();
        let outcome = apply_action(&item, ItemAction::CopyUrl, &mut clipboard).unwrap();
        assert_eq!(outcome, ActionOutcome::NoUri);
        assert!(clipboard.writes.is_empty());
    }

    #[test]
    fn test_metadata_action_defers_copy() {
        let item = sample_item();
        let mut clipboard = RecordingClipboard::default();
        match apply_action(&item, ItemAction::ShowMetadata, &mut clipboard).unwrap() {
            ActionOutcome::Metadata(text) => assert!(text.contains("URI: https://github.com")),
            other => panic!("expected metadata, got {other:?}"),
        }
        assert!(clipboard.writes.is_empty());
    }

    #[test]
    fn test_declined_metadata_is_not_copied() {
        let metadata = sample_item().metadata();
        let mut clipboard = RecordingClipboard::default();
        let copied = copy_metadata_if_confirmed(&metadata, false, &mut clipboard).unwrap();
        assert!(!copied);
        assert!(clipboard.writes.is_empty());
    }

    #[test]
    fn test_confirmed_metadata_is_copied() {
        let metadata = sample_item().metadata();
        let mut clipboard = RecordingClipboard::default();
        let copied = copy_metadata_if_confirmed(&metadata, true, &mut clipboard).unwrap();
        assert!(copied);
        assert_eq!(clipboard.writes, vec![metadata]);
    }

    #[test]
    fn test_cancel_generator_runs_nothing() {
        // A missing binary would fail if the generator were invoked.
        let client = VaultClient::with_binary("/nonexistent/bw", "");
        let mut clipboard = RecordingClipboard::default();
        let result = generate_and_copy(&client, GeneratorChoice::Cancel, &mut clipboard).unwrap();
        assert!(result.is_none());
        assert!(clipboard.writes.is_empty());
    }

    #[test]
    fn test_generator_labels() {
        assert_eq!(
            GeneratorChoice::PasswordWithSpecial.label(),
            "Password with Special (-lusn --length 18 --minSpecial 2 --minNumber 2)"
        );
        assert_eq!(GeneratorChoice::ALL[3].label(), "Cancel");
        assert_eq!(GeneratorChoice::Passphrase.kind(), Some("Passphrase"));
        assert_eq!(GeneratorChoice::Cancel.kind(), None);
    }
}
