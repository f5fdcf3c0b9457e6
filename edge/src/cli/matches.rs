use clap::Parser;

use crate::{CmdExecutor, cli::ProjectOpts, utils::load_router};

#[derive(Debug, Parser)]
pub struct MatchOpts {
    #[command(flatten)]
    pub project: ProjectOpts,
    /// Request method, compared case-sensitively
    pub method: String,
    /// Absolute url, or a path starting with `/`
    pub url: String,
}

impl CmdExecutor for MatchOpts {
    async fn execute(self) -> anyhow::Result<()> {
        let (_, router) = load_router(&self.project)?;
        match router.match_route(self.url.as_str(), &self.method)? {
            Some(matched) => {
                println!("{} {}", self.method, matched.url);
                println!("route: {}", matched.route.pattern());
                println!("params: {}", serde_json::to_string(&matched.params)?);
            }
            None => println!("no route"),
        }
        Ok(())
    }
}
