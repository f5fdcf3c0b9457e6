use clap::Parser;
use edge_router::method_label;

use crate::{CmdExecutor, cli::ProjectOpts, utils::load_config};

#[derive(Debug, Parser)]
pub struct RoutesOpts {
    #[command(flatten)]
    pub project: ProjectOpts,
}

impl CmdExecutor for RoutesOpts {
    async fn execute(self) -> anyhow::Result<()> {
        let config = load_config(&self.project)?;
        println!("{}", config.name);
        for (pattern, routes) in &config.routes {
            for route in routes {
                let method = method_label(route.method.as_ref());
                let scope = if route.match_url { " (url)" } else { "" };
                println!("  {method:<7} {pattern}{scope} -> {}", route.handler);
            }
        }
        Ok(())
    }
}
