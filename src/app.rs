//! Per-invocation application context.

use tracing::debug;

use crate::cli::progress::ProgressReporter;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::registry::HubClient;
use crate::session::SessionStore;

pub struct AppContext {
    pub config: Config,
    pub sessions: SessionStore,
    pub debug: bool,
    pub robot: bool,
    pub progress: ProgressReporter,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let sessions = SessionStore::from_config(&config.session)?;
        debug!(
            api = %config.api_base(cli.debug),
            session = %sessions.path().display(),
            "Context ready"
        );

        Ok(Self {
            sessions,
            debug: cli.debug,
            robot: cli.robot,
            progress: ProgressReporter::new(cli.robot, cli.quiet),
            config,
        })
    }

    /// Hub client for the selected API, optionally carrying a connection key.
    pub fn hub_client(&self, connection_key: Option<String>) -> Result<HubClient> {
        HubClient::from_config(&self.config, connection_key, self.debug)
    }
}
