//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod config;
pub mod expand;
pub mod fuse;
pub mod inspect;
pub mod topics;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fuse several run files into one
    Fuse(fuse::FuseArgs),

    /// Expand topic queries with RM3 or PRF feedback from a base run
    Expand(expand::ExpandArgs),

    /// Show or convert topic files
    Topics(topics::TopicsArgs),

    /// Summarize a run file, optionally against qrels
    Inspect(inspect::InspectArgs),

    /// Print the effective configuration
    Config(config::ConfigArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Fuse(args) => fuse::run(ctx, args),
        Commands::Expand(args) => expand::run(ctx, args),
        Commands::Topics(args) => topics::run(ctx, args),
        Commands::Inspect(args) => inspect::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
    }
}
