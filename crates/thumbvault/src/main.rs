//! Thumbvault CLI - download images, shrink them to thumbnails, store them in SQLite.
//!
//! # Usage
//!
//! ```bash
//! # Harvest every query in a search input file
//! thumbvault run --inputs inputs.json
//!
//! # Harvest a few URLs directly
//! thumbvault run --url https://example.com/a.png --url https://example.com/b.jpg
//!
//! # Create the images table ahead of time
//! thumbvault db init
//!
//! # View configuration
//! thumbvault config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Thumbvault - download, resize and store images in bulk.
#[derive(Parser, Debug)]
#[command(name = "thumbvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Download, resize and store images
    Run(cli::run::RunArgs),

    /// Manage the image database
    Db(cli::db::DbArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal.
    let dotenv = dotenvy::dotenv();

    let config = resolve_config(&cli.command, thumbvault_core::Config::load())?;
    logging::init(logging::LogSettings::resolve(
        &config.logging,
        cli.verbose,
        cli.json_logs,
    ));

    tracing::debug!("Thumbvault v{}", thumbvault_core::VERSION);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {:?}", path);
    }

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Db(args) => cli::db::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config).await,
    }
}

impl Commands {
    /// `config path` and `config init` exist to locate or replace a broken
    /// config file, so they must run even when it fails to load.
    fn tolerates_broken_config(&self) -> bool {
        matches!(
            self,
            Commands::Config(cli::config::ConfigArgs {
                command: cli::config::ConfigCommand::Path | cli::config::ConfigCommand::Init { .. },
            })
        )
    }
}

/// Decide what to do with the result of loading the config file.
///
/// Logging isn't initialized yet, so the fallback warning uses eprintln.
fn resolve_config(
    command: &Commands,
    loaded: Result<thumbvault_core::Config, thumbvault_core::ConfigError>,
) -> anyhow::Result<thumbvault_core::Config> {
    match loaded {
        Ok(config) => Ok(config),
        Err(e) if command.tolerates_broken_config() => {
            eprintln!("Warning: Failed to load config: {e}\n  Using default configuration.");
            let mut config = thumbvault_core::Config::default();
            config.apply_env_overrides();
            Ok(config)
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!(
            "Failed to load config from {}\n  \
             Fix the file or run `thumbvault config init --force`",
            thumbvault_core::Config::default_path().display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn invalid_config() -> Result<thumbvault_core::Config, thumbvault_core::ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nparallelism = 0\n").unwrap();
        thumbvault_core::Config::load_from(&path)
    }

    fn command(argv: &[&str]) -> Commands {
        Cli::parse_from(std::iter::once("thumbvault").chain(argv.iter().copied())).command
    }

    #[test]
    fn test_invalid_config_file_fails_run() {
        let loaded = invalid_config();
        assert!(loaded.is_err());

        let err = resolve_config(&command(&["run", "--url", "http://a/b.png"]), loaded).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("parallelism must be > 0"), "{message}");
    }

    #[test]
    fn test_invalid_config_file_fails_db_and_show() {
        assert!(resolve_config(&command(&["db", "count"]), invalid_config()).is_err());
        assert!(resolve_config(&command(&["config", "show"]), invalid_config()).is_err());
    }

    #[test]
    fn test_config_path_and_init_survive_invalid_file() {
        for argv in [&["config", "path"][..], &["config", "init", "--force"][..]] {
            let config = resolve_config(&command(argv), invalid_config()).unwrap();
            assert_eq!(config.pipeline.parallelism, 5);
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_global_flags() {
        let cli = Cli::parse_from(["thumbvault", "-v", "run", "--url", "http://a/b.png", "-p", "2"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.urls, vec!["http://a/b.png"]);
                assert_eq!(args.parallel, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_db_count_by_name() {
        let cli = Cli::parse_from(["thumbvault", "db", "count", "--name", "cats_000001.jpg"]);
        match cli.command {
            Commands::Db(args) => match args.command {
                cli::db::DbCommand::Count { name } => {
                    assert_eq!(name.as_deref(), Some("cats_000001.jpg"))
                }
                other => panic!("unexpected db command: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
