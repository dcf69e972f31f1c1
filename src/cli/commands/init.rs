//! skillhub init - Scaffold a new item from the built-in template

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::registry::EntityType;
use crate::templates::{default_folder_name, write_template};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// The type of item to create
    #[arg(long = "type", value_enum)]
    pub entity: EntityType,

    /// Where to create it; `.` picks a fresh folder name in the current directory
    #[arg(long)]
    pub output: PathBuf,
}

pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<()> {
    let target = std::path::absolute(output_folder(
        args.entity,
        &args.output,
        Utc::now().timestamp_millis(),
    ))?;
    let written = write_template(args.entity, &target)?;

    if ctx.robot {
        return emit_json(&robot_ok(serde_json::json!({
            "type": args.entity,
            "path": target.display().to_string(),
            "files": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        })));
    }

    println!(
        "{} New {} created at {}",
        "✓".green().bold(),
        args.entity,
        target.display()
    );
    Ok(())
}

fn output_folder(entity: EntityType, output: &Path, millis: i64) -> PathBuf {
    if output == Path::new(".") {
        PathBuf::from(default_folder_name(entity, millis))
    } else {
        output.to_path_buf()
    }
}
