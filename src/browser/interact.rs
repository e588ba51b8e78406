//! Element interaction helpers
//!
//! The site renders apply buttons as plain anchors distinguished only by
//! their text, so lookup goes by exact trimmed text content rather than by
//! selector alone. Stale nodes are normal while the page re-renders; they
//! are skipped unless the failure means the page itself is gone.

use crate::browser::PageHandle;
use crate::error::{Error, Result};
use chromiumoxide::element::Element;
use tracing::{debug, instrument};

/// Whether raw element text equals the wanted label once trimmed.
pub fn is_exact_text(raw: &str, wanted: &str) -> bool {
    raw.trim() == wanted
}

/// Whether a class attribute marks the element disabled.
pub fn class_is_disabled(class_attr: &str) -> bool {
    class_attr.split_whitespace().any(|c| c == "disabled")
}

/// Find all elements under `selector` whose trimmed text equals `text`.
#[instrument(skip(page))]
pub async fn find_by_exact_text(
    page: &PageHandle,
    selector: &str,
    text: &str,
) -> Result<Vec<Element>> {
    let elements = page
        .inner()
        .find_elements(selector)
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;

    let mut matches = Vec::new();
    for el in elements {
        match el.inner_text().await {
            Ok(Some(content)) if is_exact_text(&content, text) => matches.push(el),
            Ok(_) => {}
            Err(e) => {
                let err: Error = e.into();
                if err.is_page_closed() {
                    return Err(err);
                }
                // Node went stale mid-scan, skip it
                debug!("skipping stale element: {}", err);
            }
        }
    }

    debug!(count = matches.len(), "text lookup finished");
    Ok(matches)
}

/// Whether the element is disabled via attribute or class.
pub async fn is_disabled(el: &Element) -> Result<bool> {
    if el
        .attribute("disabled")
        .await
        .map_err(|e| Error::cdp(e.to_string()))?
        .is_some()
    {
        return Ok(true);
    }

    if let Some(class) = el
        .attribute("class")
        .await
        .map_err(|e| Error::cdp(e.to_string()))?
    {
        if class_is_disabled(&class) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Click the first element matching `text` under any of the selectors.
///
/// Returns whether something was clicked; absence is not an error because
/// some UI variants omit optional toggles entirely.
#[instrument(skip(page))]
pub async fn click_first_by_text(page: &PageHandle, selector: &str, text: &str) -> Result<bool> {
    let candidates = find_by_exact_text(page, selector, text).await?;
    if let Some(el) = candidates.into_iter().next() {
        el.click().await.map_err(|e| Error::cdp(e.to_string()))?;
        return Ok(true);
    }
    Ok(false)
}

/// Whether any element matches `selector` right now.
pub async fn element_exists(page: &PageHandle, selector: &str) -> Result<bool> {
    let script = format!(
        "document.querySelector({}) !== null",
        serde_json::to_string(selector)?,
    );

    let output = page
        .inner()
        .evaluate(script.as_str())
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;

    Ok(output.into_value::<bool>().unwrap_or(false))
}

/// Read the `value` of the form field under `selector`, if the field exists.
pub async fn read_input_value(page: &PageHandle, selector: &str) -> Result<Option<String>> {
    let script = format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.value : null; }})()",
        serde_json::to_string(selector)?,
    );

    let output = page
        .inner()
        .evaluate(script.as_str())
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;

    Ok(output.into_value::<Option<String>>().unwrap_or(None))
}

/// Focus the field under `selector` and type `text` into it.
#[instrument(skip(page, text))]
pub async fn type_into(page: &PageHandle, selector: &str, text: &str) -> Result<()> {
    let field = page
        .inner()
        .find_element(selector)
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;

    field
        .click()
        .await
        .map_err(|e| Error::cdp(e.to_string()))?
        .type_str(text)
        .await
        .map_err(|e| Error::cdp(e.to_string()))?;

    Ok(())
}
