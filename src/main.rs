use airwrite::app::{ReplayOptions, run_replay};
use airwrite::cli::{Cli, Commands, ConfigAction};
use airwrite::config::Config;
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Replay {
            frames,
            templates,
            threshold,
            idle_timeout,
            commit_on_end,
            export,
            interactive,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(path) = templates {
                config.recognition.templates = Some(path);
            }
            if let Some(threshold) = threshold {
                config.recognition.acceptance_threshold = threshold;
            }
            if let Some(ms) = idle_timeout {
                config.tracking.idle_timeout_ms = ms;
            }
            config.validate()?;

            run_replay(
                config,
                ReplayOptions {
                    frames,
                    commit_on_end,
                    export,
                    interactive,
                    quiet: cli.quiet,
                },
            )?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "airwrite", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-q` / `-v` pick the level.
fn init_logging(quiet: bool, verbose: u8) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration with priority: custom path > default path > defaults,
/// then environment overrides.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path()?)?
    };
    Ok(config.with_env_overrides())
}

fn config_path(custom_path: Option<&Path>) -> Result<PathBuf> {
    match custom_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::default_path()?),
    }
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path(custom_path)?.display());
        }
        ConfigAction::Init { force } => {
            let path = config_path(custom_path)?;
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, Config::default().to_toml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display().dimmed());
        }
    }
    Ok(())
}
