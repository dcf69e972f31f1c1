//! Hub login and logout
//!
//! - `skillhub login`  - Check a connection key and store it with the user's identity
//! - `skillhub logout` - Delete the stored session

use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::{HubError, Result};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::registry::Registry;
use crate::session::Session;

const KEY_PROMPT: &str = "Enter your AnythingLLM Hub connection key:";

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Connection key; prompted for when omitted
    #[arg(long, env = "SKILLHUB_CONNECTION_KEY", hide_env_values = true)]
    pub connection_key: Option<String>,
}

pub fn login(ctx: &AppContext, args: &LoginArgs) -> Result<()> {
    let key = match args.connection_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => TerminalPrompter::new().secret(KEY_PROMPT)?,
    };

    let client = ctx.hub_client(Some(key.clone()))?;
    let session = authenticate(&client, &key)?;
    ctx.sessions.save(&session)?;
    info!(path = %ctx.sessions.path().display(), "Logged in");

    if ctx.robot {
        return emit_json(&robot_ok(serde_json::json!({
            "logged_in": true,
            "username": session.identity().username,
            "session_file": ctx.sessions.path().display().to_string(),
        })));
    }

    match session.identity().username {
        Some(username) => println!(
            "{} Successfully logged in as @{username}!",
            "✓".green().bold()
        ),
        None => println!("{} Successfully logged in!", "✓".green().bold()),
    }
    Ok(())
}

/// Check `connection_key` and fetch the identity behind it.
pub fn authenticate(registry: &dyn Registry, connection_key: &str) -> Result<Session> {
    if connection_key.trim().is_empty() {
        return Err(HubError::Auth("Connection key is required".to_string()));
    }
    if !registry.auth_check(connection_key) {
        return Err(HubError::Auth(
            "Invalid connection key - could not authenticate".to_string(),
        ));
    }
    Ok(Session::new(connection_key, registry.user_info()))
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.sessions.clear()?;

    if ctx.robot {
        return emit_json(&robot_ok(serde_json::json!({ "logged_in": false })));
    }
    println!("{} Successfully logged out!", "✓".green().bold());
    Ok(())
}
