//! Assertion helpers
//!
//! One helper checks one condition: wait for the element, read the actual
//! value, compare, and fail with an [`E2eError::AssertionFailed`] that carries
//! expected and actual. Usable from scenario steps and plain async code alike.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use crate::api::ApiResponse;
use crate::error::{E2eError, E2eResult};
use crate::page::{Page, WaitState};

/// How long helpers wait for an element before reading it
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

async fn wait_visible(page: &dyn Page, selector: &str, timeout: Duration) -> E2eResult<()> {
    page.wait_for(selector, WaitState::Visible, timeout)
        .await
        .map_err(|e| {
            E2eError::assertion(format!("{} should be visible", selector), "visible", e)
        })
}

async fn visible_text(page: &dyn Page, selector: &str) -> E2eResult<String> {
    wait_visible(page, selector, DEFAULT_WAIT).await?;
    Ok(page
        .text_content(selector)
        .await?
        .unwrap_or_default()
        .trim()
        .to_string())
}

pub async fn assert_visible(page: &dyn Page, selector: &str) -> E2eResult<()> {
    assert_visible_within(page, selector, DEFAULT_WAIT).await
}

pub async fn assert_visible_within(page: &dyn Page, selector: &str, timeout: Duration) -> E2eResult<()> {
    wait_visible(page, selector, timeout).await
}

pub async fn assert_hidden(page: &dyn Page, selector: &str) -> E2eResult<()> {
    page.wait_for(selector, WaitState::Hidden, DEFAULT_WAIT)
        .await
        .map_err(|e| E2eError::assertion(format!("{} should be hidden", selector), "hidden", e))
}

/// Trimmed text content equals `expected`.
pub async fn assert_text(page: &dyn Page, selector: &str, expected: &str) -> E2eResult<()> {
    let actual = visible_text(page, selector).await?;
    if actual == expected {
        Ok(())
    } else {
        Err(E2eError::assertion(
            format!("text of {}", selector),
            format!("{:?}", expected),
            format!("{:?}", actual),
        ))
    }
}

pub async fn assert_text_contains(page: &dyn Page, selector: &str, needle: &str) -> E2eResult<()> {
    let actual = visible_text(page, selector).await?;
    if actual.contains(needle) {
        Ok(())
    } else {
        Err(E2eError::assertion(
            format!("text of {} should contain", selector),
            format!("{:?}", needle),
            format!("{:?}", actual),
        ))
    }
}

pub async fn assert_checkbox_state(page: &dyn Page, selector: &str, checked: bool) -> E2eResult<()> {
    wait_visible(page, selector, DEFAULT_WAIT).await?;
    let actual = page.is_checked(selector).await?;
    if actual == checked {
        Ok(())
    } else {
        let state = |c: bool| if c { "checked" } else { "unchecked" };
        Err(E2eError::assertion(
            format!("checkbox {}", selector),
            state(checked),
            state(actual),
        ))
    }
}

/// `aria-<attribute>` equals `expected`; `attribute` may be given with or without the prefix.
pub async fn assert_aria_attribute(
    page: &dyn Page,
    selector: &str,
    attribute: &str,
    expected: &str,
) -> E2eResult<()> {
    let name = if attribute.starts_with("aria-") {
        attribute.to_string()
    } else {
        format!("aria-{}", attribute)
    };
    page.wait_for(selector, WaitState::Attached, DEFAULT_WAIT)
        .await
        .map_err(|e| E2eError::assertion(format!("{} should exist", selector), "attached", e))?;
    match page.get_attribute(selector, &name).await? {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(E2eError::assertion(
            format!("{} of {}", name, selector),
            format!("{:?}", expected),
            format!("{:?}", actual),
        )),
        None => Err(E2eError::assertion(
            format!("{} of {}", name, selector),
            format!("{:?}", expected),
            "<missing>",
        )),
    }
}

static PROGRESS_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+)\s+of\s+(\d+)\b").expect("valid regex"));

/// First "N of M" in `text`.
fn parse_progress(text: &str) -> Option<(usize, usize)> {
    let caps = PROGRESS_COUNT.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Progress text reads "`done` of `total`", e.g. "2 of 4 complete".
///
/// Both numbers must match exactly; "12 of 40" is not "2 of 4".
pub async fn assert_progress_count(
    page: &dyn Page,
    selector: &str,
    done: usize,
    total: usize,
) -> E2eResult<()> {
    let expected = format!("{} of {}", done, total);
    let actual = visible_text(page, selector).await?;
    if parse_progress(&actual) == Some((done, total)) {
        Ok(())
    } else {
        Err(E2eError::assertion(
            format!("progress {}", selector),
            format!("{:?}", expected),
            format!("{:?}", actual),
        ))
    }
}

/// `None` asserts the key is absent.
pub async fn assert_local_storage(page: &dyn Page, key: &str, expected: Option<&str>) -> E2eResult<()> {
    let actual = page.local_storage_get(key).await?;
    if actual.as_deref() == expected {
        Ok(())
    } else {
        let show = |v: Option<&str>| v.map(|s| format!("{:?}", s)).unwrap_or_else(|| "<absent>".to_string());
        Err(E2eError::assertion(
            format!("localStorage[{}]", key),
            show(expected),
            show(actual.as_deref()),
        ))
    }
}

pub async fn assert_count(page: &dyn Page, selector: &str, expected: usize) -> E2eResult<()> {
    let actual = page.count(selector).await?;
    if actual == expected {
        Ok(())
    } else {
        Err(E2eError::assertion(format!("count of {}", selector), expected, actual))
    }
}

/// Status is one of `accepted`.
///
/// Widening to several codes marks backend behaviour that is not settled
/// yet (webhooks answering 200 or 500, auth vs CSRF answering 401 or 403).
pub fn assert_status_in(response: &ApiResponse, accepted: &[u16]) -> E2eResult<()> {
    if accepted.contains(&response.status) {
        Ok(())
    } else {
        let expected = accepted
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(E2eError::assertion(
            format!("status of {} (body {})", response.endpoint, response.body),
            expected,
            response.status,
        ))
    }
}

pub fn assert_status(response: &ApiResponse, expected: u16) -> E2eResult<()> {
    assert_status_in(response, &[expected])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16) -> ApiResponse {
        ApiResponse {
            endpoint: "POST /api/webhooks/shopify".to_string(),
            status,
            body: json!({}),
        }
    }

    #[test]
    fn test_parse_progress() {
        assert_eq!(parse_progress("2 of 4 complete"), Some((2, 4)));
        assert_eq!(parse_progress("Step 12 of 40"), Some((12, 40)));
        assert_eq!(parse_progress("3of4"), None);
        assert_eq!(parse_progress("no progress yet"), None);
    }

    #[test]
    fn test_status_in_accepts_listed() {
        assert!(assert_status_in(&response(500), &[200, 500]).is_ok());
        assert!(assert_status(&response(201), 201).is_ok());
    }

    #[test]
    fn test_status_in_reports_expected_and_actual() {
        let err = assert_status_in(&response(404), &[401, 403]).unwrap_err();
        match err {
            E2eError::AssertionFailed { expected, actual, .. } => {
                assert_eq!(expected, "401 or 403");
                assert_eq!(actual, "404");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
