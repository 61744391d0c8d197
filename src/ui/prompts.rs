//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{KioskError, KioskResult};

/// Ask for confirmation. `--yes` approves; without a terminal the default
/// is returned unasked.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> KioskResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| KioskError::User(format!("Prompt task failed: {}", e)))?
    .map_err(|e| KioskError::User(format!("Prompt failed: {}", e)))
}
