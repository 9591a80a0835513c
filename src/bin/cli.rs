use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chronicle_export::{ExportConfig, SqliteTaskStore, export_daily};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "chronicle-export",
    version,
    about = "Export a day of completed tasks as a zip of documents"
)]
struct Cli {
    /// JSON config file (defaults apply for missing keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database path, overrides config
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export tasks completed on one day
    Export {
        /// Day to export in YYYY-MM-DD format (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Output zip path (defaults to chronicle-<day>.zip)
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Template path, overrides config
        #[arg(long)]
        template: Option<PathBuf>,
        /// Document extension for archive entries, overrides config
        #[arg(long)]
        ext: Option<String>,
        /// Print the run summary as JSON
        #[arg(long)]
        summary: bool,
    },
    /// Create the database schema if missing
    Init,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ExportConfig::resolve(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    match cli.command {
        Command::Init => {
            SqliteTaskStore::open(&config.database_path)
                .with_context(|| format!("opening {:?}", config.database_path))?;
            println!("Initialized {}", config.database_path.display());
        }
        Command::Export {
            date,
            out,
            template,
            ext,
            summary,
        } => {
            if let Some(template) = template {
                config.template_path = template;
            }
            if let Some(ext) = ext {
                config.document_extension = ext;
            }

            let store = SqliteTaskStore::open(&config.database_path)
                .with_context(|| format!("opening {:?}", config.database_path))?;
            let export = export_daily(
                &store,
                &config.template_path,
                date.as_deref(),
                &config.document_extension,
            )?;

            let out = out.unwrap_or_else(|| PathBuf::from(format!("chronicle-{}.zip", export.day)));
            fs::write(&out, &export.archive).with_context(|| format!("writing {:?}", out))?;
            println!(
                "Exported {} ({}) to {}",
                export.day,
                export.summary.to_cli_summary(),
                out.display()
            );
            if summary {
                println!("{}", serde_json::to_string_pretty(&export.summary)?);
            }
        }
    }
    Ok(())
}
