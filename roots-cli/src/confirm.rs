//! Confirmation helpers for destructive operations.

use anyhow::{Context, Result};
use dialoguer::Confirm;

pub fn confirm_destructive_action(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation input")
}

/// Ask with `confirm`; a prompt error counts as "no".
pub fn confirmed_with<C>(prompt: &str, confirm: C) -> bool
where
    C: FnOnce(&str) -> Result<bool>,
{
    match confirm(prompt) {
        Ok(answer) => answer,
        Err(e) => {
            log::warn!("{:#}", e);
            false
        }
    }
}

pub fn confirmed(prompt: &str) -> bool {
    confirmed_with(prompt, confirm_destructive_action)
}

pub fn confirm_and_run_with<C, A>(prompt: &str, confirm: C, action: A) -> Result<bool>
where
    C: FnOnce(&str) -> Result<bool>,
    A: FnOnce() -> Result<()>,
{
    if confirm(prompt)? {
        action()?;
        Ok(true)
    } else {
        Ok(false)
    }
}
