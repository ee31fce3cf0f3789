use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use gateguard_core::{spawn_background_tasks, Guard, KickHandler};
use gateguard_proxy::{
    CommandHandler, ProxySettings, ReqwestFetcher, SqliteBackend, StaticGeoResolver,
};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(author, version, about = "GateGuard - connection admission control for game servers")]
struct Args {
    /// Config file path
    #[clap(short, long, env = "GATEGUARD_CONFIG")]
    config: Option<String>,

    /// SQLite database file, overrides the configured one
    #[clap(short, long, env = "GATEGUARD_DATA")]
    data: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let mut settings = ProxySettings::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        settings.storage.path = data;
    }

    // Wire the collaborators
    let backend = Arc::new(SqliteBackend::open(&settings.storage.path)?);
    let geo = Arc::new(StaticGeoResolver::from_settings(&settings.geo)?);
    let fetcher = Arc::new(ReqwestFetcher::new(Duration::from_secs(
        settings.http.timeout_secs,
    ))?);
    let kick: Arc<KickHandler> = Arc::new(|session: Uuid, message: String| {
        // Without a connected game host there is no session to terminate.
        warn!("Session {session} failed a post-login check: {message}");
    });

    let guard = Guard::new(settings.guard.clone(), backend, geo, fetcher, kick)?;
    let _tasks = spawn_background_tasks(&guard);

    info!("GateGuard started, address cache at {}", settings.storage.path);
    info!("Type 'help' for the available commands");

    // Admin console until EOF or Ctrl+C
    let handler = CommandHandler::new(guard.clone(), args.config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => {
                    let output = handler.dispatch(line.trim()).await;
                    if !output.is_empty() {
                        println!("{output}");
                    }
                }
                None => break,
            },
        }
    }

    guard.shutdown().await;
    info!("Stopped");

    Ok(())
}
