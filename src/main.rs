use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

mod auth;
mod cli;
mod config;
mod db;
mod import;
mod models;
mod qr;
mod session;
mod smoke;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = Config::from_env()?;

    match cli.command {
        Commands::Console => {
            let pool = db::connect(&cfg.database_url).await?;
            info!("console starting");
            cli::console::run(&pool).await?;
        }
        Commands::Import {
            users,
            requests,
            comments,
        } => {
            if users.is_none() && requests.is_none() && comments.is_none() {
                println!("Nothing to import: pass --users, --requests and/or --comments.");
                return Ok(());
            }
            let pool = db::connect(&cfg.database_url).await?;
            import::run(
                &pool,
                users.as_deref(),
                requests.as_deref(),
                comments.as_deref(),
            )
            .await?;
        }
        Commands::Qr {
            request_id,
            url,
            output,
        } => {
            let text = url.unwrap_or_else(|| qr::FEEDBACK_FORM_URL.to_string());
            let path = output.unwrap_or_else(|| PathBuf::from(qr::default_filename(request_id)));
            qr::save_png(&text, &path)?;
            println!("QR code saved to {}", path.display());
        }
        Commands::Smoke => smoke::run(&cfg.database_url).await?,
    }

    Ok(())
}
