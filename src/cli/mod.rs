//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;
pub mod progress;

/// Skillhub - validate, package and publish agent skills to the AnythingLLM Hub
#[derive(Parser, Debug)]
#[command(name = "skillhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Talk to the local development hub instead of production
    #[arg(long, global = true)]
    pub debug: bool,

    /// Machine-readable JSON output on stdout, JSON logs on stderr
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/skillhub/config.toml)
    #[arg(long, global = true, env = "SKILLHUB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to the hub with a connection key
    Login(commands::auth::LoginArgs),

    /// Log out and delete the stored connection key
    Logout,

    /// Show the stored session
    Config,

    /// Validate, package and upload an item to the hub
    Upload(commands::upload::UploadArgs),

    /// Create a new item from the built-in template
    Init(commands::init::InitArgs),
}
