//! skillhub config - Show the stored session and effective endpoints

use crate::app::AppContext;
use crate::cli::output::{emit_human, emit_json, robot_ok, HumanLayout};
use crate::error::Result;

pub fn run(ctx: &AppContext) -> Result<()> {
    let session = ctx.sessions.load_raw()?;

    if ctx.robot {
        return emit_json(&robot_ok(serde_json::json!({
            "session_file": ctx.sessions.path().display().to_string(),
            "session": session,
            "api_url": ctx.config.api_base(ctx.debug),
            "web_url": ctx.config.hub.web_url,
            "staging_dir": ctx.config.upload.staging_root().display().to_string(),
        })));
    }

    let Some(session) = session else {
        println!(
            "No config file found. Run `skillhub login` to login and save your connection key."
        );
        return Ok(());
    };

    let mut layout = HumanLayout::new();
    layout
        .title("Skillhub configuration")
        .kv("Session file", &ctx.sessions.path().display().to_string())
        .kv("API", ctx.config.api_base(ctx.debug))
        .kv("Web", &ctx.config.hub.web_url)
        .kv(
            "Staging",
            &ctx.config.upload.staging_root().display().to_string(),
        )
        .push_line("")
        .push_line(serde_json::to_string_pretty(&session)?);
    emit_human(&layout);
    Ok(())
}
