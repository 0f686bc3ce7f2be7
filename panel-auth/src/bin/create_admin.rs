//! Provision or replace an admin identity directly in the database.

use clap::Parser;
use panel_auth::{
    config::AuthConfig,
    db,
    models::{normalize_email, Role},
    services::{CredentialStore, Database},
    utils::{hash_password, Password},
};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "create-admin", about = "Create or update an admin panel account")]
struct Cli {
    /// Restaurant the account belongs to.
    #[arg(long)]
    restaurant: i64,

    /// Login email.
    #[arg(long)]
    email: String,

    /// Initial password (prefer the env var over the flag).
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    /// chef or owner.
    #[arg(long, default_value = "owner")]
    role: Role,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("create-admin failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.password.len() < 8 {
        anyhow::bail!("password must be at least 8 characters");
    }

    let config = AuthConfig::from_env()?;
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let store = Database::new(pool);

    let email = normalize_email(&cli.email);
    let hash = hash_password(&Password::new(cli.password))?;

    let admin = store
        .upsert_admin(cli.restaurant, &email, hash.as_str(), cli.role)
        .await?;

    println!(
        "admin {} ready: restaurant={} email={} role={}",
        admin.id, admin.restaurant_id, admin.email, admin.role
    );
    Ok(())
}
