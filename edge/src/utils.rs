use std::fs;

use anyhow::{Context, Result};
use edge_router::{ProjectConfig, Res, Router};

use crate::cli::ProjectOpts;

pub(crate) fn load_config(opts: &ProjectOpts) -> Result<ProjectConfig> {
    ProjectConfig::load(&opts.config)
        .with_context(|| format!("failed to load {}", opts.config.display()))
}

/// Loads the route table and worker module and registers every route.
pub(crate) fn load_router(opts: &ProjectOpts) -> Result<(ProjectConfig, Router<Res>)> {
    let config = load_config(opts)?;
    let code = fs::read_to_string(&opts.code)
        .with_context(|| format!("failed to read {}", opts.code.display()))?;
    let router = config.build_router(code)?;
    Ok((config, router))
}
