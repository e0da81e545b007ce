use chrono::Local;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fxsnap::app::AppContext;
use fxsnap::cli::{commands, Cli};
use fxsnap::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Failures must stay visible without RUST_LOG set
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fxsnap=warn")))
        .init();

    let cli = Cli::parse();
    let Some(days) = cli.days else {
        eprintln!("No argument provided. Please provide the number of days as an argument.");
        std::process::exit(2);
    };

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);

    let ctx = AppContext::new(config)?;
    let today = Local::now().date_naive();
    commands::snapshot(&ctx, days, today, !cli.no_progress).await?;

    Ok(())
}
