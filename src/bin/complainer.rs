use std::time::Duration;

use clap::Parser;
use complainer::{
    actors::monitor::MonitorHandle,
    cluster::HttpCluster,
    config::{build_reporters, read_config_file},
    monitor::Monitor,
    uploader::NoopUploader,
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("complainer", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let cluster = HttpCluster::new(&config.cluster.url)?;
    let reporters = build_reporters(&config);
    debug!(
        "configured reporters: {:?}",
        reporters.keys().collect::<Vec<_>>()
    );

    let monitor = Monitor::new(config.name(), cluster, NoopUploader, reporters)
        .with_timeout(config.timeout_delta()?);

    info!(
        "starting monitor {} against {} every {}s",
        monitor.name(),
        config.cluster.url,
        config.interval
    );

    let handle = MonitorHandle::spawn(monitor, Duration::from_secs(config.interval));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await?;

    Ok(())
}
