use std::sync::Arc;

use clap::Parser;
use flapjack_bridge::{
    BrokerConfig, ConnectionHandle, EventTranslator, HANDLER_DESCRIPTION, HANDLER_NAME,
    SeverityTable, Unreachable,
    broker::redis_queue::RedisConnector,
    config::read_settings_file,
    pipe::forward_events,
    util::get_settings_path,
};
use tokio::io::BufReader;
use tracing::{debug, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(name = HANDLER_NAME, about = HANDLER_DESCRIPTION)]
struct Args {
    /// Settings file (JSON, broker settings under the "flapjack" key)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the list key alert records are pushed onto
    #[arg(long)]
    channel: Option<String>,
}

fn init() {
    let filter =
        filter::Targets::new().with_targets(vec![("flapjack_bridge", LevelFilter::DEBUG)]);
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

fn resolve_config(args: &Args) -> anyhow::Result<BrokerConfig> {
    let mut config = match args.config.clone().or_else(get_settings_path) {
        Some(path) => BrokerConfig::from_settings(&read_settings_file(&path)?)?,
        None => BrokerConfig::default(),
    };

    if let Some(channel) = &args.channel {
        config.channel = channel.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = resolve_config(&args)?;
    debug!("forwarding to {} on '{}'", config.endpoint(), config.channel);

    let connector = Arc::new(RedisConnector::new(&config));
    let connection = match ConnectionHandle::connect(&config, connector).await {
        Ok(handle) => handle,
        Err(Unreachable { handle, error }) => {
            warn!("{error}");
            handle
        }
    };

    let translator = EventTranslator::new(
        connection.clone(),
        config.channel.clone(),
        Arc::new(SeverityTable::default()),
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let failed = forward_events(&translator, stdin, &mut tokio::io::stdout()).await?;

    connection.shutdown().await?;

    if failed > 0 {
        anyhow::bail!("{failed} event(s) could not be delivered");
    }

    Ok(())
}
