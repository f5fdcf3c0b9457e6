use clap::Parser;
use edge_router::{ChannelEvent, Req};
use tracing::info;

use crate::{CmdExecutor, cli::ProjectOpts, utils::load_router};

#[derive(Debug, Parser)]
pub struct RunOpts {
    #[command(flatten)]
    pub project: ProjectOpts,
    pub method: String,
    pub url: String,
    #[arg(short, long)]
    pub body: Option<String>,
}

impl CmdExecutor for RunOpts {
    async fn execute(self) -> anyhow::Result<()> {
        let (config, router) = load_router(&self.project)?;
        info!("project {}: {} routes", config.name, router.len());

        let mut req = Req::builder().method(self.method).url(self.url).build();
        req.body = self.body;

        let (mut event, response) = ChannelEvent::new(req);
        router.handle_event(&mut event)?;
        drop(event);

        match response.settle().await? {
            Some(res) => println!("{}", serde_json::to_string_pretty(&res)?),
            None => println!("no route"),
        }
        Ok(())
    }
}
