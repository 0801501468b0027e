//! rankfuse config - Show the effective configuration

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::config::{Config, PROJECT_CONFIG_FILE};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// List the config file locations instead of the values
    #[arg(long)]
    pub paths: bool,
}

#[derive(Debug, Serialize)]
struct ConfigLocation {
    scope: &'static str,
    path: Option<PathBuf>,
    exists: bool,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    if args.paths {
        return show_paths(ctx);
    }

    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(&ctx.config));
    }
    print!("{}", ctx.config.to_toml()?);
    Ok(())
}

fn locations(ctx: &AppContext) -> Vec<ConfigLocation> {
    let global = Config::global_path();
    let project = ctx.project_root.join(PROJECT_CONFIG_FILE);
    vec![
        ConfigLocation {
            scope: "global",
            exists: global.as_ref().is_some_and(|path| path.exists()),
            path: global,
        },
        ConfigLocation {
            scope: "project",
            exists: project.exists(),
            path: Some(project),
        },
    ]
}

fn show_paths(ctx: &AppContext) -> Result<()> {
    let locations = locations(ctx);
    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(&locations));
    }

    let mut layout = HumanLayout::new();
    layout.title("Config files");
    for location in &locations {
        let path = location
            .path
            .as_ref()
            .map_or_else(|| "-".to_string(), |path| path.display().to_string());
        let marker = if location.exists { "" } else { " (missing)" };
        layout.kv(location.scope, &format!("{path}{marker}"));
    }
    layout.blank().bullet("RANKFUSE_CONFIG or --config replaces both files");
    output::emit_human(&layout);
    Ok(())
}
