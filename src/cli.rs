//! Command-line interface for mediascribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Offline media-file transcription
#[derive(Parser, Debug)]
#[command(
    name = "mediascribe",
    version = crate::version_string(),
    about = "Transcribe a media file to text using ffmpeg and Whisper"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Media file to transcribe (video or audio)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Whisper model tier (tiny, base, small, medium, large)
    #[arg(long, value_name = "TIER")]
    pub model: Option<String>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, de, es, fr
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Directory for the transcript file
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Inference batch size
    #[arg(long, short = 'b', value_name = "N")]
    pub batch_size: Option<usize>,

    /// Decoder timeout (default: 300s). Examples: 30s, 5m, 1h30m
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout_secs)]
    pub timeout: Option<u64>,
}

/// Parse a timeout duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that ffmpeg and a model are available
    Check,
    /// List model tiers and their installed state
    Models,
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommand actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the default config file path
    Path,
    /// Print the effective configuration as TOML
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_transcription_invocation() {
        let cli = Cli::parse_from(["mediascribe", "talk.mp4"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.input, Some(PathBuf::from("talk.mp4")));
        assert!(!cli.quiet);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "mediascribe",
            "talk.mp4",
            "--model",
            "small",
            "--language",
            "de",
            "-o",
            "out",
            "-b",
            "8",
            "--timeout",
            "5m",
        ]);
        assert_eq!(cli.model.as_deref(), Some("small"));
        assert_eq!(cli.language.as_deref(), Some("de"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.batch_size, Some(8));
        assert_eq!(cli.timeout, Some(300));
    }

    #[test]
    fn parse_timeout_bare_number_is_seconds() {
        assert_eq!(parse_timeout_secs("42"), Ok(42));
    }

    #[test]
    fn parse_timeout_humantime_formats() {
        assert_eq!(parse_timeout_secs("30s"), Ok(30));
        assert_eq!(parse_timeout_secs("5m"), Ok(300));
        assert_eq!(parse_timeout_secs("1h30m"), Ok(5400));
    }

    #[test]
    fn parse_timeout_rejects_garbage() {
        assert!(parse_timeout_secs("soon").is_err());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["mediascribe", "check"]);
        assert!(matches!(cli.command, Some(Commands::Check)));

        let cli = Cli::parse_from(["mediascribe", "models"]);
        assert!(matches!(cli.command, Some(Commands::Models)));

        let cli = Cli::parse_from(["mediascribe", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Path
            })
        ));
    }

    #[test]
    fn version_flag_reports_build_version() {
        let err = Cli::try_parse_from(["mediascribe", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(err.to_string().contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn verbose_flag_counts() {
        let cli = Cli::parse_from(["mediascribe", "talk.mp4", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
