//! Response modal workflow
//!
//! Drives the in-page application form: the cover-letter toggle, the
//! letter textarea, and the submit button. Also recognizes the site's
//! daily application limit, which surfaces as an error block inside the
//! same modal.

use tracing::{error, info, instrument};

use crate::browser::{interact, PageHandle, PageNavigator};
use crate::error::{Error, Result};

/// The application form that opens in a modal over the search page.
pub const MODAL_FORM_SELECTOR: &str = r#"form#RESPONSE_MODAL_FORM_ID[name="vacancy_response"]"#;

/// Cover-letter textarea inside the modal.
pub const LETTER_TEXTAREA_SELECTOR: &str =
    r#"textarea[data-qa="vacancy-response-popup-form-letter-input"]"#;

/// Submit button inside the modal.
pub const SUBMIT_SELECTOR: &str = r#"[data-qa="vacancy-response-submit-popup"]"#;

/// Error block shown when the daily application limit is exceeded.
pub const LIMIT_ERROR_SELECTOR: &str =
    r#"[data-qa-popup-error-code="negotiations-limit-exceeded"]"#;

/// The modal's close button.
pub const MODAL_CLOSE_SELECTOR: &str = r#"[data-qa="response-popup-close"]"#;

/// Text of the toggle that reveals the cover-letter field.
pub const COVER_TOGGLE_TEXT: &str = "Добавить сопроводительное";

/// Elements the cover-letter toggle may be rendered as.
const COVER_TOGGLE_SELECTOR: &str = "button, a, span";

/// How long to wait for the letter textarea once the toggle is clicked.
const TEXTAREA_WAIT_TIMEOUT_MS: u64 = 30_000;

/// How the modal interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    /// The cover letter was verified and the application submitted
    Submitted,
    /// The site reported the daily application limit
    LimitReached,
    /// The textarea did not end up holding the expected message; nothing
    /// was submitted
    LetterMismatch,
}

/// Wait for the modal form to become visible.
///
/// The timeout error is ordinary (not closed-page), so the caller can skip
/// the button instead of aborting the run.
pub async fn wait_for_form(page: &PageHandle, timeout_ms: u64) -> Result<()> {
    PageNavigator::wait_for_selector(page, MODAL_FORM_SELECTOR, true, timeout_ms).await
}

/// Whether the modal currently shows the application-limit error.
pub async fn limit_reached(page: &PageHandle) -> Result<bool> {
    interact::element_exists(page, LIMIT_ERROR_SELECTOR).await
}

/// Close the modal via its close button, if the button is present.
pub async fn close(page: &PageHandle) -> Result<()> {
    if interact::element_exists(page, MODAL_CLOSE_SELECTOR).await? {
        let button = page
            .inner()
            .find_element(MODAL_CLOSE_SELECTOR)
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;
        button
            .click()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;
        info!("Closed the application modal");
    }
    Ok(())
}

/// Fill in the cover letter and submit the application.
///
/// Assumes the modal form is already visible. Types into the textarea only
/// when it is empty; a previous partially-finished run may have left the
/// message there already, and typing again would double it.
#[instrument(skip(page, message))]
pub async fn submit_with_letter(page: &PageHandle, message: &str) -> Result<ModalOutcome> {
    if limit_reached(page).await? {
        return Ok(ModalOutcome::LimitReached);
    }

    if interact::click_first_by_text(page, COVER_TOGGLE_SELECTOR, COVER_TOGGLE_TEXT).await? {
        info!("Opened the cover letter field");
    }

    PageNavigator::wait_for_selector(page, LETTER_TEXTAREA_SELECTOR, true, TEXTAREA_WAIT_TIMEOUT_MS)
        .await?;

    let current = interact::read_input_value(page, LETTER_TEXTAREA_SELECTOR).await?;
    match current.as_deref() {
        Some(value) if !value.trim().is_empty() => {
            info!("Textarea already contains text, skipping typing to prevent double entry");
        }
        _ => {
            interact::type_into(page, LETTER_TEXTAREA_SELECTOR, message).await?;
            info!("Typed cover letter message");
        }
    }

    let value = interact::read_input_value(page, LETTER_TEXTAREA_SELECTOR)
        .await?
        .unwrap_or_default();
    if value != message {
        error!(
            expected = message.chars().count(),
            actual = value.chars().count(),
            "Textarea value does not match expected message, not submitting"
        );
        return Ok(ModalOutcome::LetterMismatch);
    }

    info!("Verified textarea contains target message");

    let submit = page
        .inner()
        .find_element(SUBMIT_SELECTOR)
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;
    submit
        .click()
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;

    info!("Clicked submit button");
    Ok(ModalOutcome::Submitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_target_qa_attributes() {
        assert!(MODAL_FORM_SELECTOR.contains("RESPONSE_MODAL_FORM_ID"));
        assert!(LETTER_TEXTAREA_SELECTOR.contains("data-qa"));
        assert!(SUBMIT_SELECTOR.contains("vacancy-response-submit-popup"));
        assert!(LIMIT_ERROR_SELECTOR.contains("negotiations-limit-exceeded"));
    }

    #[test]
    fn test_modal_outcome_variants_distinct() {
        assert_ne!(ModalOutcome::Submitted, ModalOutcome::LimitReached);
        assert_ne!(ModalOutcome::Submitted, ModalOutcome::LetterMismatch);
    }
}
