use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{RankfuseError, Result};
use crate::expansion::AnalyzerCache;

/// Process-lifetime state shared by every command.
pub struct AppContext {
    pub project_root: PathBuf,
    pub config: Config,
    /// Analyzers by language, built lazily and kept for the whole process.
    pub analyzers: Arc<AnalyzerCache>,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let project_root = std::env::current_dir().map_err(|err| RankfuseError::io(".", err))?;
        let config = Config::load(cli.config.as_deref(), &project_root)?;

        Ok(Self {
            project_root,
            config,
            analyzers: Arc::new(AnalyzerCache::new()),
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    /// Context over an already-built config; used by tests and embedders.
    pub fn with_config(config: Config, analyzers: Arc<AnalyzerCache>) -> Self {
        Self {
            project_root: PathBuf::from("."),
            config,
            analyzers,
            robot_mode: false,
            verbosity: 0,
        }
    }
}
