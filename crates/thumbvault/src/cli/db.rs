//! The `thumbvault db` command for the image database.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use thumbvault_core::{Config, ImageStore, SqliteStore};

/// Arguments for the `db` command.
#[derive(Args, Debug)]
pub struct DbArgs {
    /// Database file (overrides the config file)
    #[arg(long, global = true, env = "THUMBVAULT_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: DbCommand,
}

/// Subcommands for database management.
#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Create the images table if it does not exist
    Init,

    /// Count stored images
    Count {
        /// Only count images stored under this file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the database path
    Path,
}

/// Execute the db command.
pub async fn execute(args: DbArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(database) = args.database {
        config.store.database = database;
    }
    let path = config.database_path();

    match args.command {
        DbCommand::Path => {
            println!("{}", path.display());
        }

        DbCommand::Init => {
            let store = SqliteStore::from_config(&path, &config.store)?;
            store.ensure_schema().await?;
            println!("images table ready in {}", path.display());
        }

        DbCommand::Count { name } => {
            if !path.exists() {
                anyhow::bail!(
                    "Database not found at {}\n\n  Hint: Run `thumbvault db init` or `thumbvault run` first.",
                    path.display()
                );
            }
            let store = SqliteStore::from_config(&path, &config.store)?;
            store.ensure_schema().await?;
            let count = match name {
                Some(name) => store.count_named(&name).await?,
                None => store.count().await?,
            };
            println!("{count}");
        }
    }

    Ok(())
}
