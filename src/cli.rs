//! Command-line interface for airwrite
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Turn fingertip strokes into letters, words and a conversation
#[derive(Parser, Debug)]
#[command(name = "airwrite", version, about = "Air-writing recognition from hand landmarks")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded landmark stream (JSON Lines) through the pipeline
    Replay {
        /// Recorded frames, one JSON object per line
        #[arg(value_name = "FRAMES.jsonl")]
        frames: PathBuf,

        /// Letter template set (JSON); defaults to the built-in set
        #[arg(long, value_name = "FILE")]
        templates: Option<PathBuf>,

        /// Acceptance threshold override (0.0 to 1.0)
        #[arg(long, value_name = "F")]
        threshold: Option<f32>,

        /// Idle timeout override (e.g., 750ms, 2s)
        #[arg(long, value_name = "DURATION", value_parser = parse_millis)]
        idle_timeout: Option<u64>,

        /// Commit the word in progress when the recording ends
        #[arg(long)]
        commit_on_end: bool,

        /// Conversation export format printed on exit
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        export: ExportFormat,

        /// Read commands from stdin (commit, restart, clear, clear-stroke, start, stop, toggle)
        #[arg(long)]
        interactive: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration (file + environment overrides)
    Show,
    /// Print the configuration file path
    Path,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One word per line
    #[default]
    Text,
    /// JSON array of words
    Json,
}

/// Parse a duration into milliseconds.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`750ms`, `2s`, `1s500ms`).
fn parse_millis(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}
