//! hh-pilot - automated job applications for hh.ru
//!
//! This crate drives a visible Chrome through the Chrome DevTools Protocol
//! (ChromiumOxide) to click apply buttons and fill cover letters on the
//! hh.ru vacancy-search page.
//!
//! # Features
//!
//! - **Resilient waiting**: polling loops that survive tab switches,
//!   manual navigation, and transient CDP failures, and stop gracefully
//!   when the user closes the page
//! - **Redirect recovery**: distinguishes "a modal opened" from "the site
//!   navigated to an external form" after each click and waits for the
//!   user to come back in the second case
//! - **Persistent session**: a user-data directory keeps cookies and login
//!   state between runs, with the profile's translate prompts disabled
//!
//! # Architecture
//!
//! ```text
//! CLI ──▶ App driver ──▶ Apply Runner ──▶ Response Modal
//!              │              │
//!              ▼              ▼
//!       Browser Controller  Condition Poller
//!              (CDP)        (wait::wait_for_url_prefix)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clap::Parser;
//! use hh_pilot::config::{Cli, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_cli(Cli::parse_from(["hh-pilot", "--manual-login"]))?;
//!     let summary = hh_pilot::app::run(settings).await?;
//!
//!     println!("submitted {} applications", summary.submitted);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod wait;
pub mod workflow;

// Re-exports for convenience
pub use browser::BrowserController;
pub use config::{Cli, Settings};
pub use error::{Error, Result};
pub use wait::{PollOptions, ShutdownSignal, WaitOutcome};
pub use workflow::{ApplyRunner, RunOutcome, RunSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
