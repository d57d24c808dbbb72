//! The `thumbvault config` command.

use std::path::Path;

use clap::{Args, Subcommand};
use thumbvault_core::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings (file, environment and defaults merged)
    Show,

    /// Print where the config file is looked up
    Path,

    /// Write a config file holding every default
    Init {
        /// Replace an existing (possibly broken) config file
        #[arg(long)]
        force: bool,
    },
}

pub async fn execute(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    let path = Config::default_path();
    match args.command {
        ConfigCommand::Show => print!("{}", render_effective(&config, &path)?),
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init { force } => {
            write_defaults(&path, force)?;
            tracing::info!("Wrote default configuration to {:?}", path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// The merged configuration as TOML, headed by where it was looked up.
fn render_effective(config: &Config, path: &Path) -> anyhow::Result<String> {
    let origin = if path.exists() {
        format!("# loaded from {}", path.display())
    } else {
        format!("# no file at {}; built-in defaults", path.display())
    };
    Ok(format!("{origin}\n{}", config.to_toml()?))
}

/// Write `Config::default()` to `path`, creating parent directories.
fn write_defaults(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_defaults_creates_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        write_defaults(&path, false).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pipeline.parallelism, 5);
        assert_eq!(config.resize.filter, "lanczos3");
    }

    #[test]
    fn test_write_defaults_needs_force_to_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nparallelism = 0\n").unwrap();

        let err = write_defaults(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(Config::load_from(&path).is_err());

        write_defaults(&path, true).unwrap();
        assert!(Config::load_from(&path).is_ok());
    }

    #[test]
    fn test_render_effective_names_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let rendered = render_effective(&Config::default(), &path).unwrap();
        assert!(rendered.starts_with("# no file at"));
        assert!(rendered.contains("[pipeline]"));

        std::fs::write(&path, "").unwrap();
        let rendered = render_effective(&Config::default(), &path).unwrap();
        assert!(rendered.starts_with("# loaded from"));
    }
}
