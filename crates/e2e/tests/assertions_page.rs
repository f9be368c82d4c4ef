//! Assertion helpers against an in-memory page

mod support;

use shopbot_e2e::assertions::*;
use shopbot_e2e::selectors::prerequisite_checklist as checklist;
use shopbot_e2e::E2eError;
use test_case::test_case;

use support::{FakeElement, FakePage};

fn expected_actual(err: E2eError) -> (String, String, String) {
    match err {
        E2eError::AssertionFailed {
            message,
            expected,
            actual,
        } => (message, expected, actual),
        other => panic!("expected AssertionFailed, got {}", other),
    }
}

#[tokio::test]
async fn progress_count_matches_and_reports_mismatch() {
    let page = FakePage::new();
    page.put(checklist::PROGRESS, FakeElement::new().text("  3 of 4 complete "));

    assert_progress_count(page.as_ref(), checklist::PROGRESS, 3, 4).await.unwrap();

    let err = assert_progress_count(page.as_ref(), checklist::PROGRESS, 2, 4)
        .await
        .unwrap_err();
    let (_, expected, actual) = expected_actual(err);
    assert!(expected.contains("2 of 4"));
    assert!(actual.contains("3 of 4 complete"));
}

#[test_case("12 of 40 complete" ; "both numbers longer")]
#[test_case("2 of 45 complete" ; "total longer")]
#[test_case("22 of 4" ; "done longer")]
#[test_case("0 of 4 complete" ; "different done")]
#[test_case("Getting started" ; "no count at all")]
#[tokio::test]
async fn progress_count_rejects_other_counts(text: &str) {
    let page = FakePage::new();
    page.put("#progress", FakeElement::new().text(text));

    let err = assert_progress_count(page.as_ref(), "#progress", 2, 4)
        .await
        .unwrap_err();
    let (_, expected, actual) = expected_actual(err);
    assert_eq!(expected, "\"2 of 4\"");
    assert!(actual.contains(text));
}

#[tokio::test]
async fn text_assertions() {
    let page = FakePage::new();
    page.put("h1", FakeElement::new().text("Business Info"));

    assert_text(page.as_ref(), "h1", "Business Info").await.unwrap();
    assert_text_contains(page.as_ref(), "h1", "Business").await.unwrap();

    let (message, expected, actual) =
        expected_actual(assert_text(page.as_ref(), "h1", "FAQ").await.unwrap_err());
    assert!(message.contains("h1"));
    assert_eq!(expected, "\"FAQ\"");
    assert_eq!(actual, "\"Business Info\"");
}

#[tokio::test]
async fn visibility_assertions() {
    let page = FakePage::new();
    page.put("#shown", FakeElement::new());
    page.put("#hidden", FakeElement::new().hidden());

    assert_visible(page.as_ref(), "#shown").await.unwrap();
    assert_hidden(page.as_ref(), "#hidden").await.unwrap();
    assert_hidden(page.as_ref(), "#absent").await.unwrap();

    let (_, expected, _) =
        expected_actual(assert_visible(page.as_ref(), "#hidden").await.unwrap_err());
    assert_eq!(expected, "visible");
}

#[tokio::test]
async fn checkbox_follows_clicks() {
    let page = FakePage::new();
    page.put(checklist::CLOUD_ACCOUNT, FakeElement::new().checked(false));

    assert_checkbox_state(page.as_ref(), checklist::CLOUD_ACCOUNT, false).await.unwrap();
    shopbot_e2e::Page::click(page.as_ref(), checklist::CLOUD_ACCOUNT).await.unwrap();
    assert_checkbox_state(page.as_ref(), checklist::CLOUD_ACCOUNT, true).await.unwrap();

    let (_, expected, actual) = expected_actual(
        assert_checkbox_state(page.as_ref(), checklist::CLOUD_ACCOUNT, false)
            .await
            .unwrap_err(),
    );
    assert_eq!((expected.as_str(), actual.as_str()), ("unchecked", "checked"));
}

#[tokio::test]
async fn aria_attribute_with_or_without_prefix() {
    let page = FakePage::new();
    page.put("[role='progressbar']", FakeElement::new().attr("aria-valuenow", "50"));

    assert_aria_attribute(page.as_ref(), "[role='progressbar']", "valuenow", "50").await.unwrap();
    assert_aria_attribute(page.as_ref(), "[role='progressbar']", "aria-valuenow", "50").await.unwrap();

    let (_, _, actual) = expected_actual(
        assert_aria_attribute(page.as_ref(), "[role='progressbar']", "valuemax", "100")
            .await
            .unwrap_err(),
    );
    assert_eq!(actual, "<missing>");
}

#[tokio::test]
async fn local_storage_and_count() {
    let page = FakePage::new();
    shopbot_e2e::Page::local_storage_set(page.as_ref(), "auth_token", "t-1").await.unwrap();
    page.put("li", FakeElement::new().count(3));

    assert_local_storage(page.as_ref(), "auth_token", Some("t-1")).await.unwrap();
    assert_local_storage(page.as_ref(), "missing", None).await.unwrap();
    let (_, expected, actual) = expected_actual(
        assert_local_storage(page.as_ref(), "auth_token", None).await.unwrap_err(),
    );
    assert_eq!((expected.as_str(), actual.as_str()), ("<absent>", "\"t-1\""));

    assert_count(page.as_ref(), "li", 3).await.unwrap();
    assert_count(page.as_ref(), "tr", 0).await.unwrap();
    assert!(assert_count(page.as_ref(), "li", 2).await.is_err());
}
