use std::sync::Arc;

use subrewind::common::banner::{BannerInfo, print_banner};
use subrewind::common::{logger, types::AnyResult};
use subrewind::configs::Config;
use subrewind::monitor::Monitor;
use subrewind::transport::PlexServer;
use tracing::info;

#[tokio::main]
async fn main() -> AnyResult<()> {
    print_banner(&BannerInfo::default());

    let config = Config::load()?;
    logger::init(&config);

    let server = Arc::new(PlexServer::new(&config.server)?);
    info!("watching sessions on {}", config.server.url);

    let monitor = Monitor::start(config.monitor.clone(), server);

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    monitor.stop().await;

    Ok(())
}
