use clap::Parser;
use starter_api::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env.local / .env must be loaded before the config singleton is first read
    starter_api::config::load_env_files();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    starter_api::cli::run(cli).await
}
