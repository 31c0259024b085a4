use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::OverrunPolicy;

pub mod status;
pub use status::StatusDisplay;

/// Gap-free stream handover demo driven by simulated players
#[derive(Debug, Parser)]
#[command(name = "rhandover")]
#[command(about = "Seamless two-player stream handover with an audio resync buffer")]
#[command(version = "0.1.0")]
pub struct CliApp {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Play a URL on simulated players and report what the orchestrator does
    Run(RunArgs),
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// URL to start with
    pub url: String,

    /// URL to hand over to partway through
    #[arg(long)]
    pub next: Option<String>,

    /// When to request the next URL (e.g. "1:30", "90", "2.5s")
    #[arg(long, value_parser = parse_time, default_value = "3")]
    pub switch_at: Duration,

    /// Restart the stream when it ends
    #[arg(long = "loop")]
    pub looping: bool,

    /// Wait for a switch cue instead of swapping as soon as the handover is ready
    #[arg(long)]
    pub cued: bool,

    /// Start every stream at this offset
    #[arg(long, value_parser = parse_time)]
    pub start: Option<Duration>,

    /// Stop the demo after this long
    #[arg(long, value_parser = parse_time, default_value = "10")]
    pub duration: Duration,

    /// Preview stream to show for one second midway
    #[arg(long)]
    pub preview: Option<String>,

    /// Simulated length of each stream
    #[arg(long, value_parser = parse_time, default_value = "6")]
    pub stream_length: Duration,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Restore default settings
    Reset,
    /// Set the handover buffer level (percent) required before a swap
    Threshold { value: f32 },
    /// Set the default volume (0-100)
    Volume { level: u8 },
    /// Set what the audio ring does on overrun
    Overrun { policy: OverrunArg },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverrunArg {
    DropOldest,
    DropNewest,
}

impl From<OverrunArg> for OverrunPolicy {
    fn from(arg: OverrunArg) -> Self {
        match arg {
            OverrunArg::DropOldest => OverrunPolicy::DropOldest,
            OverrunArg::DropNewest => OverrunPolicy::DropNewest,
        }
    }
}

impl CliApp {
    /// Parse command line arguments
    pub fn parse() -> Self {
        <Self as clap::Parser>::parse()
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.as_deref().map(expand_path)
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        }
    } else if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

/// Parse "MM:SS", "MM:SS.f", "90", "90s" or "2.5" into a duration
pub fn parse_time(input: &str) -> Result<Duration, ParseError> {
    let invalid = || ParseError::InvalidTimeFormat {
        input: input.to_string(),
    };
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let seconds = match trimmed.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            if !(0.0..60.0).contains(&seconds) {
                return Err(invalid());
            }
            minutes as f64 * 60.0 + seconds
        }
        None => {
            let seconds: f64 = trimmed.trim_end_matches('s').parse().map_err(|_| invalid())?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(invalid());
            }
            seconds
        }
    };

    Ok(Duration::from_secs_f64(seconds))
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid time format: {input}")]
    InvalidTimeFormat { input: String },
}
