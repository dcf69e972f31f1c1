//! Interactive prompts
//!
//! Everything that asks the user a question goes through [`Prompter`], so
//! manifest resolution and the upload flow can be driven by a scripted
//! prompter in tests.
//!
//! A cancelled prompt (Esc, Ctrl-C, closed stdin) is reported as
//! [`HubError::UserAbort`], never as a validation failure.

use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

use crate::error::{HubError, Result};

pub const CANCELLED: &str = "Exited by user interrupt";

pub trait Prompter {
    /// Free-form text. May return an empty string.
    fn text(&mut self, message: &str) -> Result<String>;

    /// Secret text, not echoed.
    fn secret(&mut self, message: &str) -> Result<String>;

    /// Pick one of `choices`; `None` when the user cancels the selection.
    fn select(&mut self, message: &str, choices: &[&str]) -> Result<Option<String>>;

    /// Yes/no question.
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Terminal prompter backed by dialoguer.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn text(&mut self, message: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map(|value| value.trim().to_string())
            .map_err(map_dialoguer_error)
    }

    fn secret(&mut self, message: &str) -> Result<String> {
        Password::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty_password(true)
            .interact()
            .map(|value| value.trim().to_string())
            .map_err(map_dialoguer_error)
    }

    fn select(&mut self, message: &str, choices: &[&str]) -> Result<Option<String>> {
        let picked = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact_opt()
            .map_err(map_dialoguer_error)?;
        Ok(picked.and_then(|idx| choices.get(idx).map(|choice| (*choice).to_string())))
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact_opt()
            .map_err(map_dialoguer_error)?;
        answer.ok_or_else(|| HubError::UserAbort(CANCELLED.to_string()))
    }
}

fn map_dialoguer_error(err: dialoguer::Error) -> HubError {
    let dialoguer::Error::IO(err) = err;
    match err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof | io::ErrorKind::NotConnected => {
            HubError::UserAbort(CANCELLED.to_string())
        }
        _ => HubError::Io(err),
    }
}
