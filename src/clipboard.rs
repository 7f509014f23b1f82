//! Clipboard access.

use crate::error::{BbwError, Result};
use copypasta::{ClipboardContext, ClipboardProvider};

/// Destination for copied secrets.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    fn write_all(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    #[cfg(test)]
    fn get_contents(&self) -> Result<String> {
        let mut ctx = ClipboardContext::new().map_err(|e| BbwError::Clipboard(e.to_string()))?;
        ctx.get_contents()
            .map_err(|e| BbwError::Clipboard(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn write_all(&mut self, text: &str) -> Result<()> {
        let mut ctx = ClipboardContext::new().map_err(|e| BbwError::Clipboard(e.to_string()))?;
        ctx.set_contents(text.to_string())
            .map_err(|e| BbwError::Clipboard(e.to_string()))
    }
}
