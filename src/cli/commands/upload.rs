//! skillhub upload - Validate, package and publish a skill folder

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_human, emit_json, robot_ok, HumanLayout};
use crate::error::{HubError, Result};
use crate::prompt::TerminalPrompter;
use crate::registry::{EntityType, Registry, Visibility};
use crate::upload::{UploadOrchestrator, UploadReport, UploadRequest};

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// The type of item to upload
    #[arg(long = "type", value_enum)]
    pub entity: EntityType,

    /// Folder to upload, absolute or relative to the current directory
    #[arg(long)]
    pub path: PathBuf,

    /// Who can see the item; asked interactively when omitted
    #[arg(long, value_enum)]
    pub visibility: Option<Visibility>,

    /// Upload without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(ctx: &AppContext, args: &UploadArgs) -> Result<()> {
    let session = ctx.sessions.load()?;
    let key = session.require_key()?.to_string();
    let folder = resolve_folder(&args.path)?;

    let client = ctx.hub_client(Some(key.clone()))?;
    if !ctx.debug {
        ctx.progress.log("Logging into hub.anythingllm.com...");
    }
    if !client.auth_check(&key) {
        return Err(HubError::Auth(
            "Invalid connection key - could not authenticate.".to_string(),
        ));
    }

    let mut prompter = TerminalPrompter::new();
    let report = UploadOrchestrator::new(&client, &mut prompter, &ctx.progress)
        .identity(session.identity())
        .staging_root(ctx.config.upload.staging_root())
        .web_url(ctx.config.hub.web_url.as_str())
        .run(&UploadRequest {
            folder,
            entity: args.entity,
            visibility: args.visibility,
            assume_yes: args.yes,
        })?;

    if ctx.robot {
        return emit_json(&robot_ok(&report));
    }
    emit_human(&report_layout(&report));
    Ok(())
}

/// Absolute path of an existing directory.
pub fn resolve_folder(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(HubError::ValidationFailed(
            "--path argument was provided but the path does not exist".to_string(),
        ));
    }
    if !fs::metadata(path)?.is_dir() {
        return Err(HubError::ValidationFailed(
            "--path argument was provided but the path is not a directory".to_string(),
        ));
    }
    Ok(fs::canonicalize(path)?)
}

fn report_layout(report: &UploadReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .push_line("")
        .push_line(format!(
            "{} {} v{} published",
            "🎉".bold(),
            report.name.bold(),
            report.version
        ))
        .kv("Entity", &report.entity_id)
        .kv("Visibility", report.visibility.as_str())
        .kv("Files", &report.file_count.to_string())
        .kv("Archive", &format!("{} bytes", report.archive_bytes))
        .kv("URL", &report.url.cyan().to_string());
    layout
}
