use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canteen_client::{
    cli::{self, Cli},
    config::AppConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,canteen_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(api_url) = args.api_url.as_deref() {
        config = config.with_api_url(api_url)?;
    }
    tracing::debug!(api_url = %config.api_url, "starting");

    if cli::run(args, config).await.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
