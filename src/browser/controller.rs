//! Browser lifecycle management
//!
//! Launches a visible Chrome with a persistent profile directory, keeps the
//! CDP event handler drained, and exposes the page the workflow drives. The
//! handler stream ending means the browser is gone, which latches the
//! shutdown signal so every waiting loop unwinds gracefully.

use crate::error::{BrowserError, Error, Result};
use crate::wait::ShutdownSignal;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Chrome switches that keep the automated profile from nagging the user.
///
/// Mirrors a hand-tuned set: no "Restore pages?" bubble after a hard exit,
/// no first-run tour, no default-browser prompt.
const LAUNCH_ARGS: &[&str] = &[
    "--start-maximized",
    "--disable-session-crashed-bubble",
    "--hide-crash-restore-bubble",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-crash-restore",
];

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Persistent user data directory (cookies, session storage)
    pub user_data_dir: PathBuf,
    /// Browser window width (default: 1920)
    pub width: u32,
    /// Browser window height (default: 1080)
    pub height: u32,
    /// Enable sandbox (default: true)
    pub sandbox: bool,
    /// Path to Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<PathBuf>,
    /// Additional Chrome arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_data_dir: PathBuf::from(".hh-pilot-profile"),
            width: 1920,
            height: 1080,
            sandbox: true,
            chrome_path: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Create a new config builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Set the persistent user data directory
    pub fn user_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.user_data_dir = dir.into();
        self
    }

    /// Set viewport dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable/disable sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Set Chrome path
    pub fn chrome_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Add extra Chrome argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Handle to the page the workflow drives
#[derive(Clone)]
pub struct PageHandle {
    page: Page,
}

impl PageHandle {
    /// Get the underlying chromiumoxide Page
    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Read the live URL of the page.
    ///
    /// A target that reports no URL is treated as a transient failure, so
    /// callers polling through this recover once the page settles.
    pub async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await?
            .ok_or_else(|| Error::cdp("page reported no URL"))
    }
}

/// High-level browser controller
pub struct BrowserController {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserController {
    /// Launch the browser and wire its event stream to the shutdown signal.
    #[instrument(skip(config, signal))]
    pub async fn launch(config: BrowserConfig, signal: &ShutdownSignal) -> Result<Self> {
        info!(
            "Launching browser with profile {}",
            config.user_data_dir.display()
        );

        let mut builder = CdpBrowserConfig::builder()
            .with_head()
            .user_data_dir(&config.user_data_dir)
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: config.width,
                height: config.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            });

        if !config.sandbox {
            builder = builder.arg("--no-sandbox");
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Drain CDP events until the connection dies. The stream ending is
        // the "browser closed" notification.
        let handler_signal = signal.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!("Browser handler event error: {}", err);
                    break;
                }
            }
            debug!("Browser handler finished");
            handler_signal.trigger();
        });

        info!("Browser launched successfully");

        Ok(Self {
            browser,
            handler: handler_task,
        })
    }

    /// The page the automation drives.
    ///
    /// A persistent profile restores its previous tab on launch; reuse it
    /// instead of opening a second one, the way a user would.
    #[instrument(skip(self))]
    pub async fn main_page(&self) -> Result<PageHandle> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        let page = match pages.into_iter().next() {
            Some(page) => page,
            None => self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?,
        };

        debug!("Acquired main page");
        Ok(PageHandle { page })
    }

    /// Close the browser and wait briefly for the handler to drain.
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");

        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;

        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler).await;

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_default() {
        let config = BrowserConfig::default();
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert!(config.sandbox);
        assert!(config.chrome_path.is_none());
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_browser_config_builder() {
        let config = BrowserConfig::builder()
            .user_data_dir("/tmp/profile")
            .viewport(1280, 720)
            .sandbox(false)
            .chrome_path("/usr/bin/chromium")
            .arg("--disable-gpu")
            .build();

        assert_eq!(config.user_data_dir, PathBuf::from("/tmp/profile"));
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert!(!config.sandbox);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(config.extra_args, vec!["--disable-gpu"]);
    }

    #[test]
    fn test_launch_args_suppress_restore_prompts() {
        assert!(LAUNCH_ARGS.contains(&"--hide-crash-restore-bubble"));
        assert!(LAUNCH_ARGS.contains(&"--disable-session-crashed-bubble"));
        assert!(LAUNCH_ARGS.contains(&"--no-first-run"));
    }
}
