//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod auth;
pub mod config;
pub mod init;
pub mod upload;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Login(args) => auth::login(ctx, args),
        Commands::Logout => auth::logout(ctx),
        Commands::Config => config::run(ctx),
        Commands::Upload(args) => upload::run(ctx, args),
        Commands::Init(args) => init::run(ctx, args),
    }
}
