use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod run;

#[derive(Parser)]
#[command(name = "linkgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Membership-gated video link bot for Telegram", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot service
    Run {
        /// Path to the SQLite link database
        #[arg(long, default_value = "links.db")]
        db_path: PathBuf,
    },
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run { db_path } => run::execute(db_path).await,
    }
}
