use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use csvload_core::{db, loader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bulk-load a directory of CSV files into Postgres", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every file in the data directory into its matching table
    Load(LoadArgs),
}

#[derive(Args, Debug, Default)]
struct LoadArgs {
    /// Directory of CSV files; each base name must match an existing table
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Load(args) => handle_load(args).await,
    }
}

async fn handle_load(args: LoadArgs) -> Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("CSVLOAD_DATABASE_URL"))
        .context("DATABASE_URL (or CSVLOAD_DATABASE_URL) must be set")?;

    let mut conn = db::connect(&database_url).await?;
    let report = loader::run(&mut conn, &args.data_dir).await?;
    db::close(conn).await?;

    info!(
        files = report.files.len(),
        total_rows = report.total_rows,
        "Load complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
