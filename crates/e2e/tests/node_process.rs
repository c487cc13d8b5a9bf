use std::path::PathBuf;
use std::time::{Duration, Instant};

use bank_ui_e2e::playwright::{PlaywrightConfig, PlaywrightHandle};
use bank_ui_e2e::{E2eError, TestStep};

/// Node Process Tests
///
/// Run generated case scripts through a real `node` against the stub
/// Playwright packages in `tests/fixtures/stub_modules`, so the event
/// protocol, the case timeout and module resolution are checked without a
/// browser. Skipped when `node` is not on PATH.
fn node_available() -> bool {
    std::process::Command::new("node")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

macro_rules! skip_if_no_node {
    () => {
        if !node_available() {
            eprintln!("node not found; skipping");
            return;
        }
    };
}

fn stub_modules() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stub_modules")
}

fn handle(screenshot_dir: PathBuf, case_timeout: Duration) -> PlaywrightHandle {
    PlaywrightHandle::new(PlaywrightConfig {
        base_url: "http://frontend.test".to_string(),
        screenshot_dir,
        case_timeout,
        node_modules: Some(stub_modules()),
        ..Default::default()
    })
    .expect("handle")
}

#[tokio::test]
async fn failing_step_stops_case_and_saves_screenshot() {
    skip_if_no_node!();

    let dir = tempfile::tempdir().expect("tempdir");
    let playwright = handle(dir.path().join("screenshots"), Duration::from_secs(30));

    let steps = vec![
        TestStep::Navigate { url: "/login".into(), wait_for_selector: None },
        TestStep::Click { selector: ".missing-create-account".into(), timeout_ms: None },
        TestStep::Log { message: "never reached".into() },
    ];
    let outcome = playwright
        .execute_case("nav from login", &steps)
        .await
        .expect("script runs");

    assert!(!outcome.success());
    assert_eq!(outcome.steps.len(), 2);
    assert!(outcome.steps[0].success);
    assert!(!outcome.steps[1].success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("click:.missing-create-account - no such element")
    );

    let shot = outcome.failure_screenshot.expect("failure screenshot reported");
    assert!(shot.is_absolute());
    assert!(shot.exists(), "{} was not written", shot.display());
}

#[tokio::test]
async fn passing_case_reports_every_step() {
    skip_if_no_node!();

    let dir = tempfile::tempdir().expect("tempdir");
    let playwright = handle(dir.path().join("screenshots"), Duration::from_secs(30));

    let steps = vec![
        TestStep::Navigate { url: "/signup".into(), wait_for_selector: None },
        TestStep::Assert {
            selector: ".header-title".into(),
            visible: None,
            text: None,
            text_contains: Some("Register a new account".into()),
            count: None,
            timeout_ms: None,
        },
        TestStep::AssertUrl { contains: "signup".into(), timeout_ms: None },
    ];
    let outcome = playwright
        .execute_case("nav from url", &steps)
        .await
        .expect("script runs");

    assert!(outcome.success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.steps.len(), 3);
    assert!(outcome.steps.iter().all(|s| s.success));
    assert!(outcome.failure_screenshot.is_none());
}

#[tokio::test]
async fn hanging_case_times_out() {
    skip_if_no_node!();

    let dir = tempfile::tempdir().expect("tempdir");
    let playwright = handle(dir.path().join("screenshots"), Duration::from_secs(1));

    let steps = vec![TestStep::Navigate { url: "/hang".into(), wait_for_selector: None }];
    let start = Instant::now();
    let result = playwright.execute_case("hangs", &steps).await;

    assert!(matches!(result, Err(E2eError::Timeout(_))), "got {:?}", result.map(|o| o.error));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn check_installed_resolves_through_node_path() {
    skip_if_no_node!();

    let dir = tempfile::tempdir().expect("tempdir");
    let playwright = handle(dir.path().join("screenshots"), Duration::from_secs(30));
    playwright.check_installed().await.expect("stub packages resolve");
}

#[tokio::test]
async fn check_installed_without_playwright() {
    let dir = tempfile::tempdir().expect("tempdir");
    let playwright = PlaywrightHandle::new(PlaywrightConfig {
        screenshot_dir: dir.path().join("screenshots"),
        node_modules: Some(dir.path().join("empty_modules")),
        ..Default::default()
    })
    .expect("handle");

    let result = playwright.check_installed().await;
    assert!(matches!(result, Err(E2eError::PlaywrightNotFound)));
}
