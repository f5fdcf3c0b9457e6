use anyhow::Result;
use edge_router::{ChannelEvent, ProjectConfig, Req};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{
    Layer as _, fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt as _,
};

#[tokio::main]
async fn main() -> Result<()> {
    let layer = Layer::new().with_filter(LevelFilter::DEBUG);
    tracing_subscriber::registry().with(layer).init();

    let config = include_str!("../fixtures/config.yml");
    let config = ProjectConfig::from_yaml(config)?;
    let router = config.build_router(include_str!("../fixtures/worker.js"))?;

    info!("router: {:?}", router);

    for (method, url) in [
        ("GET", "/user/bob"),
        ("POST", "/_ping"),
        ("GET", "https://api.foobar.com/hello"),
        ("GET", "https://api.foobar2.com/hello"),
    ] {
        let req = Req::builder().method(method).url(url).build();
        let (mut event, response) = ChannelEvent::new(req);
        router.handle_event(&mut event)?;
        drop(event);
        info!("{} {} => {:?}", method, url, response.settle().await?);
    }

    Ok(())
}
