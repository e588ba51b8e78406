//! CLI arguments and resolved runtime settings
//!
//! Flags mirror the command line of the original automation: a start URL
//! (with `START_URL` env fallback), a manual-login toggle, a persistent
//! user-data directory, the per-application interval, and the cover letter
//! message (with `MESSAGE` env fallback).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use regex::Regex;

use crate::error::{Error, NavigationError, Result};

/// Default vacancy-search page to drive.
pub const DEFAULT_START_URL: &str = "https://hh.ru/search/vacancy?from=resumelist";

/// Default pattern recognizing the vacancy-search page after a click.
pub const DEFAULT_TARGET_PATTERN: &str = r"^https://hh\.ru/search/vacancy";

/// Default seconds to wait between submitted applications.
pub const DEFAULT_APPLY_INTERVAL_SECS: u64 = 20;

/// Back-off after the site reports the daily application limit.
pub const LIMIT_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Stock cover letter, used when neither `--message` nor `MESSAGE` is given.
pub const DEFAULT_MESSAGE: &str = "В какой форме предлагается юридическое оформление удалённой работы?

Посмотреть мой код на GitHub можно тут:

github.com/konard
github.com/deep-assistant
github.com/linksplatform
github.com/link-foundation";

/// Automated job-application assistant for hh.ru
#[derive(Parser, Debug)]
#[command(name = "hh-pilot")]
#[command(version)]
#[command(about = "Clicks apply buttons and fills cover letters on hh.ru, waiting patiently for the human parts")]
pub struct Cli {
    /// URL to navigate to
    #[arg(short, long, env = "START_URL", default_value = DEFAULT_START_URL)]
    pub url: String,

    /// Open the login page and wait for manual authentication before starting
    #[arg(long)]
    pub manual_login: bool,

    /// Path to the user data directory for persistent session storage
    #[arg(long)]
    pub user_data_dir: Option<PathBuf>,

    /// Seconds to wait between job application submissions
    #[arg(long, default_value_t = DEFAULT_APPLY_INTERVAL_SECS)]
    pub apply_interval: u64,

    /// Cover letter message to send with each application
    #[arg(short, long, env = "MESSAGE")]
    pub message: Option<String>,

    /// Regex recognizing the vacancy-search page
    #[arg(long, default_value = DEFAULT_TARGET_PATTERN)]
    pub target_pattern: String,

    /// Path to a Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved runtime settings, validated from the CLI surface.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Vacancy-search page the automation drives
    pub start_url: String,
    /// Whether to route through the login page first
    pub manual_login: bool,
    /// Persistent browser profile directory
    pub user_data_dir: PathBuf,
    /// Pause between submitted applications
    pub apply_interval: Duration,
    /// Cover letter text
    pub message: String,
    /// Pattern recognizing the vacancy-search page
    pub target_pattern: Regex,
    /// Explicit browser executable, if any
    pub chrome_path: Option<PathBuf>,
    /// Back-off after the daily application limit is hit
    pub limit_backoff: Duration,
    /// Verbose logging toggle
    pub verbose: bool,
}

impl Settings {
    /// Validate and resolve CLI arguments into settings.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if !cli.url.starts_with("http://") && !cli.url.starts_with("https://") {
            return Err(NavigationError::InvalidUrl(format!(
                "URL must start with http:// or https://: {}",
                cli.url
            ))
            .into());
        }

        let target_pattern = Regex::new(&cli.target_pattern)
            .map_err(|e| Error::generic(format!("Invalid target pattern: {}", e)))?;

        let user_data_dir = match cli.user_data_dir {
            Some(dir) => dir,
            None => default_user_data_dir()?,
        };

        Ok(Self {
            start_url: cli.url,
            manual_login: cli.manual_login,
            user_data_dir,
            apply_interval: Duration::from_secs(cli.apply_interval),
            message: cli.message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            target_pattern,
            chrome_path: cli.chrome_path,
            limit_backoff: LIMIT_BACKOFF,
            verbose: cli.verbose,
        })
    }
}

/// `~/.hh-automation/browser-data`, the persistent profile location.
pub fn default_user_data_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| Error::generic("Could not determine home directory"))?;
    Ok(home.join(".hh-automation").join("browser-data"))
}
