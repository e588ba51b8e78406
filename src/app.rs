//! Top-level run orchestration
//!
//! Owns the pieces the rest of the crate only borrows: the shutdown
//! signal, the browser lifecycle, and the order of the startup steps
//! (preferences patch, launch, optional manual login, apply loop).

use tracing::{info, warn};

use crate::browser::{prefs, BrowserConfig, BrowserController, PageNavigator};
use crate::config::Settings;
use crate::error::Result;
use crate::wait::{ShutdownSignal, WaitOutcome};
use crate::workflow::{login, ApplyRunner, RunOutcome, RunSummary};

/// Launch the browser and drive the whole automation to completion.
///
/// The browser is closed on the way out regardless of how the run ended;
/// a close failure after the user already closed the window is ignored.
pub async fn run(settings: Settings) -> Result<RunSummary> {
    if let Err(e) = prefs::disable_translate(&settings.user_data_dir).await {
        warn!("Could not modify Preferences file: {}", e);
    }

    let signal = ShutdownSignal::new();
    {
        let signal = signal.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, closing browser gracefully");
                signal.trigger();
            }
        });
    }

    let mut builder = BrowserConfig::builder().user_data_dir(&settings.user_data_dir);
    if let Some(ref path) = settings.chrome_path {
        builder = builder.chrome_path(path.clone());
    }
    let browser = BrowserController::launch(builder.build(), &signal).await?;

    let result = drive(&browser, &settings, &signal).await;

    if let Err(e) = browser.close().await {
        if !e.is_page_closed() {
            warn!("Error closing browser: {}", e);
        }
    }

    result
}

async fn drive(
    browser: &BrowserController,
    settings: &Settings,
    signal: &ShutdownSignal,
) -> Result<RunSummary> {
    let page = browser.main_page().await?;

    if settings.manual_login {
        match login::manual_login(&page, &settings.start_url, signal).await? {
            WaitOutcome::Satisfied => {}
            _ => {
                return Ok(RunSummary {
                    submitted: 0,
                    skipped: 0,
                    outcome: RunOutcome::Aborted,
                })
            }
        }
    } else {
        PageNavigator::goto(&page, &settings.start_url, None).await?;
    }

    let runner = ApplyRunner::new(&page, signal, settings);
    let summary = runner.run().await?;

    info!(
        summary = %serde_json::to_string(&summary)?,
        "Run finished"
    );
    Ok(summary)
}
