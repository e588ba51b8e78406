//! Manual login flow
//!
//! Routes through the account login page with a backurl pointing at the
//! start URL, then polls until the user finishes authenticating and the
//! site bounces them back.

use tracing::{info, instrument};
use url::Url;

use crate::browser::{PageHandle, PageNavigator};
use crate::error::{NavigationError, Result};
use crate::wait::{self, PollOptions, ShutdownSignal, WaitOutcome};

const LOGIN_PAGE: &str = "https://hh.ru/account/login";

/// Build the login URL that redirects back to `start_url` after auth.
pub fn login_url(start_url: &str) -> Result<String> {
    let mut url =
        Url::parse(LOGIN_PAGE).map_err(|e| NavigationError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("role", "applicant")
        .append_pair("backurl", start_url)
        .append_pair("hhtmFrom", "vacancy_search_list");
    Ok(url.into())
}

/// Open the login page and wait indefinitely for the user to authenticate.
///
/// Resolves `Satisfied` once the page lands back on `start_url`, or
/// `Aborted` if the user closes the tab instead.
#[instrument(skip(page, signal))]
pub async fn manual_login(
    page: &PageHandle,
    start_url: &str,
    signal: &ShutdownSignal,
) -> Result<WaitOutcome> {
    let login = login_url(start_url)?;

    info!("Opening login page for manual authentication");
    info!("Login URL: {}", login);

    PageNavigator::goto(page, &login, None).await?;

    info!(
        "The browser will automatically continue once you are redirected to: {}",
        start_url
    );

    let outcome = wait::wait_for_url_prefix(
        || page.current_url(),
        start_url,
        signal,
        PollOptions::default(),
        "Waiting for you to complete login",
    )
    .await;

    if outcome == WaitOutcome::Satisfied {
        info!("Login successful! Proceeding with automation");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_login_url_encodes_backurl() {
        let url = login_url("https://hh.ru/search/vacancy?from=resumelist").unwrap();

        assert!(url.starts_with("https://hh.ru/account/login?"));
        assert!(url.contains("role=applicant"));
        assert!(url.contains("hhtmFrom=vacancy_search_list"));
        // The backurl value must not leak raw separators into the outer query
        assert!(url.contains("backurl=https%3A%2F%2Fhh.ru%2Fsearch%2Fvacancy%3Ffrom%3Dresumelist"));
        assert!(!url.contains("backurl=https://"));
    }

    #[test]
    fn test_login_url_roundtrips_through_query_parsing() {
        let start = "https://hh.ru/search/vacancy?from=resumelist&page=3";
        let url = Url::parse(&login_url(start).unwrap()).unwrap();

        let back: String = url
            .query_pairs()
            .find(|(k, _)| k == "backurl")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(back, start);
    }
}
