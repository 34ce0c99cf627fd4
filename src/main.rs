use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use feedwatch::{Config, Database, DiscordNotifier, HttpFeedFetcher, Watcher};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = feedwatch::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        feedwatch::logging::init_console_only(&config.logging.level);
    }

    info!("feedwatch - Feed Registry Watcher");

    if let Err(e) = run(&config).await {
        error!("Fatal: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(config: &Config) -> feedwatch::Result<()> {
    let db = Arc::new(Database::connect(&config.database.url).await?);
    let fetcher = HttpFeedFetcher::new(&config.fetch)?;
    let notifier = DiscordNotifier::new(&config.notify)?;

    info!(
        "Watching feeds from {} every {} seconds",
        config.watcher.watchlist_path, config.watcher.interval_secs
    );

    let watcher = Watcher::with_interval(
        db,
        fetcher,
        notifier,
        &config.watcher.watchlist_path,
        config.watcher.interval_secs,
    );

    watcher.run().await
}
