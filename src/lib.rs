pub mod app;
pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod skill;
pub mod templates;
pub mod test_utils;
pub mod upload;

pub use error::{HubError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
