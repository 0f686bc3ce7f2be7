//! Delete refresh sessions that were revoked or expired beyond the retention window.

use clap::Parser;
use panel_auth::{
    config::AuthConfig,
    db,
    services::{Database, SessionService},
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cleanup-sessions", about = "Purge stale refresh sessions")]
struct Cli {
    /// Retention in days; defaults to SESSION_RETENTION_DAYS.
    #[arg(long)]
    retention: Option<i64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(deleted) => {
            println!("deleted {deleted} stale sessions");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("cleanup-sessions failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u64> {
    let config = AuthConfig::from_env()?;
    let retention = cli.retention.unwrap_or(config.session.retention_days);

    let pool = db::create_pool(&config.database).await?;
    let sessions = SessionService::new(Arc::new(Database::new(pool)));

    Ok(sessions.cleanup(retention).await?)
}
