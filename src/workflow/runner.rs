//! Application loop and redirect recovery
//!
//! The outer loop of the automation: find apply buttons, click one, work
//! out whether a modal opened or the site navigated away, and recover.
//! Clicking an apply button has two legitimate outcomes the site chooses
//! between per vacancy: an in-page modal, or a redirect to a separate
//! application-form page the user must fill by hand. The second case is
//! handled by waiting indefinitely for the user to come back.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use chromiumoxide::element::Element;

use crate::browser::{interact, PageHandle, PageNavigator};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::wait::{self, PollOptions, ShutdownSignal, WaitOutcome};
use crate::workflow::modal::{self, ModalOutcome};

/// Text of the apply links on the search page.
pub const APPLY_BUTTON_TEXT: &str = "Откликнуться";

/// How long to listen for a navigation after clicking an apply button.
pub const NAV_DETECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause after the click race so delayed redirects can finish.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Pause after the modal closes before touching the page again.
const MODAL_CLOSE_DELAY: Duration = Duration::from_secs(2);

/// Pause after returning from an external form page before re-scanning.
const RELOAD_DELAY: Duration = Duration::from_secs(1);

/// How long the modal gets to appear before the button is skipped.
const MODAL_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Bounded wait for the page to render any links at all.
const PAGE_CONTENT_TIMEOUT_MS: u64 = 30_000;

/// What a click on an apply button turned out to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The browser navigated to a different page
    Navigated,
    /// No navigation was observed within the detection window
    StayedOnPage,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// No apply buttons remain
    Completed,
    /// The user closed the page or interrupted the run
    Aborted,
}

/// Totals reported when the run ends.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Applications submitted
    pub submitted: u32,
    /// Buttons skipped (disabled, modal never appeared, letter mismatch)
    pub skipped: u32,
    /// How the run ended
    pub outcome: RunOutcome,
}

/// Resolve a navigation-detection future against a bounded window.
///
/// Timing out, or the navigation wait failing, both mean "no navigation
/// happened" rather than an error; staying on the page is a normal outcome
/// of clicking a button that opens a modal.
pub async fn detect_navigation<N>(nav: N, window: Duration) -> ClickOutcome
where
    N: Future<Output = Result<()>>,
{
    match tokio::time::timeout(window, nav).await {
        Ok(Ok(())) => ClickOutcome::Navigated,
        Ok(Err(_)) | Err(_) => ClickOutcome::StayedOnPage,
    }
}

/// Drives the apply loop over a single page.
pub struct ApplyRunner<'a> {
    page: &'a PageHandle,
    signal: &'a ShutdownSignal,
    settings: &'a Settings,
}

impl<'a> ApplyRunner<'a> {
    /// Create a runner over an already-navigated page.
    pub fn new(page: &'a PageHandle, signal: &'a ShutdownSignal, settings: &'a Settings) -> Self {
        Self {
            page,
            signal,
            settings,
        }
    }

    /// Run the apply loop until no buttons remain or the user stops it.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        let mut submitted: u32 = 0;
        let mut skipped: u32 = 0;

        loop {
            if self.signal.is_triggered() {
                return Ok(self.summary(submitted, skipped, RunOutcome::Aborted));
            }

            let button = match self.next_apply_button(&mut skipped).await? {
                Some(button) => button,
                None => {
                    info!(
                        "No more \"{}\" buttons found. Automation completed successfully",
                        APPLY_BUTTON_TEXT
                    );
                    return Ok(self.summary(submitted, skipped, RunOutcome::Completed));
                }
            };

            let click_outcome = self.click_racing_navigation(button).await?;
            tokio::time::sleep(SETTLE_DELAY).await;

            let current_url = self.page.current_url().await?;
            if !self.settings.target_pattern.is_match(&current_url) {
                match self.recover_from_redirect(&current_url).await {
                    WaitOutcome::Satisfied => continue,
                    _ => return Ok(self.summary(submitted, skipped, RunOutcome::Aborted)),
                }
            }

            // Still on the search page; the click should have opened the
            // modal (the race outcome is informational only, redirects can
            // land after the detection window).
            info!(?click_outcome, "Staying on search page, waiting for modal");

            match modal::wait_for_form(self.page, MODAL_WAIT_TIMEOUT_MS).await {
                Ok(()) => {}
                Err(e) if e.is_page_closed() => return Err(e),
                Err(e) => {
                    warn!("Response modal did not appear: {}. Skipping this button", e);
                    skipped += 1;
                    continue;
                }
            }

            match modal::submit_with_letter(self.page, &self.settings.message).await? {
                ModalOutcome::Submitted => {
                    submitted += 1;
                    info!(submitted, "Application submitted");
                }
                ModalOutcome::LetterMismatch => {
                    skipped += 1;
                }
                ModalOutcome::LimitReached => {
                    if !self.back_off_from_limit().await? {
                        return Ok(self.summary(submitted, skipped, RunOutcome::Aborted));
                    }
                    continue;
                }
            }

            tokio::time::sleep(MODAL_CLOSE_DELAY).await;

            info!(
                "Waiting {} seconds before processing next button",
                self.settings.apply_interval.as_secs()
            );
            if !self.interruptible_sleep(self.settings.apply_interval).await {
                return Ok(self.summary(submitted, skipped, RunOutcome::Aborted));
            }
        }
    }

    /// Find the first enabled apply button, counting disabled ones as
    /// skipped. `None` means no clickable button remains.
    async fn next_apply_button(
        &self,
        skipped: &mut u32,
    ) -> Result<Option<Element>> {
        PageNavigator::wait_for_selector(self.page, "a", false, PAGE_CONTENT_TIMEOUT_MS).await?;

        let buttons = interact::find_by_exact_text(self.page, "a", APPLY_BUTTON_TEXT).await?;
        if buttons.is_empty() {
            return Ok(None);
        }

        info!(
            "Found {} \"{}\" button(s). Processing next button",
            buttons.len(),
            APPLY_BUTTON_TEXT
        );

        let mut disabled: u32 = 0;
        for button in buttons {
            match interact::is_disabled(&button).await {
                Ok(false) => {
                    *skipped += disabled;
                    return Ok(Some(button));
                }
                Ok(true) => disabled += 1,
                Err(e) if e.is_page_closed() => return Err(e),
                Err(_) => {} // stale node, ignore
            }
        }

        warn!(disabled, "Only disabled apply buttons remain");
        *skipped += disabled;
        Ok(None)
    }

    /// Click the button while listening for a navigation in parallel.
    async fn click_racing_navigation(&self, button: Element) -> Result<ClickOutcome> {
        let nav = async {
            self.page
                .inner()
                .wait_for_navigation()
                .await
                .map(|_| ())
                .map_err(|e| Error::cdp(e.to_string()))
        };
        let click = async {
            button
                .click()
                .await
                .map(|_| ())
                .map_err(|e| Error::cdp(e.to_string()))
        };

        let (click_result, outcome) = tokio::join!(click, detect_navigation(nav, NAV_DETECT_TIMEOUT));
        click_result?;
        Ok(outcome)
    }

    /// The click led off the search page: wait for the user to fill the
    /// external form and navigate back.
    async fn recover_from_redirect(&self, current_url: &str) -> WaitOutcome {
        warn!("Redirected to a different page: {}", current_url);
        info!("This appears to be a separate application form page");
        info!("Please fill out the form manually. Take as much time as you need");
        info!("Once done, navigate back to: {}", self.settings.start_url);

        let outcome = wait::wait_for_url_prefix(
            || self.page.current_url(),
            &self.settings.start_url,
            self.signal,
            PollOptions::default(),
            "Waiting for you to return to the target page",
        )
        .await;

        if outcome == WaitOutcome::Satisfied {
            info!("Returned to target page! Continuing with button loop");
            tokio::time::sleep(RELOAD_DELAY).await;
        }
        outcome
    }

    /// Daily limit hit: close the modal, back off, reload the search page.
    /// Returns false when the shutdown signal fired during the back-off.
    async fn back_off_from_limit(&self) -> Result<bool> {
        warn!("Limit reached: application quota exhausted");
        modal::close(self.page).await?;

        info!(
            "Waiting {} minutes before retrying",
            self.settings.limit_backoff.as_secs() / 60
        );
        if !self.interruptible_sleep(self.settings.limit_backoff).await {
            return Ok(false);
        }

        info!("Refreshing the page after wait period");
        PageNavigator::goto(self.page, &self.settings.start_url, None).await?;
        tokio::time::sleep(SETTLE_DELAY).await;
        Ok(true)
    }

    /// Sleep that wakes early when the shutdown signal fires.
    /// Returns false if the signal interrupted the sleep.
    async fn interruptible_sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.signal.triggered() => false,
        }
    }

    fn summary(&self, submitted: u32, skipped: u32, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            submitted,
            skipped,
            outcome,
        }
    }
}
