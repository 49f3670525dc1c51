use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod console;

#[derive(Parser)]
#[command(name = "climate-service")]
#[command(about = "Service ticket tracker for a climate equipment repair shop", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive operator console
    Console,
    /// Seed the database from legacy semicolon-delimited files
    Import {
        #[arg(long)]
        users: Option<PathBuf>,
        #[arg(long)]
        requests: Option<PathBuf>,
        #[arg(long)]
        comments: Option<PathBuf>,
    },
    /// Render the feedback-form QR code (or a custom URL) to a PNG file
    Qr {
        /// Request the code is printed for; only used in the filename
        #[arg(long)]
        request_id: Option<i32>,
        /// Encode this URL instead of the feedback form
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Sequential end-to-end check against a live database
    Smoke,
}
