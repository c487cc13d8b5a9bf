//! Main test runner that orchestrates readiness, suites and Playwright

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::app::{AppConfig, AppUnderTest};
use crate::error::E2eResult;
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::spec::{Suite, TestCase};
use crate::template::Bindings;

/// Result of running a single test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub skipped: bool,
    pub duration_ms: u64,

    /// Random suffix drawn for this case
    pub id: Option<u32>,

    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure_screenshot: Option<String>,
}

/// Result of running one suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub name: String,
    pub duration_ms: u64,
    pub cases: Vec<TestResult>,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub suites: Vec<SuiteResult>,
}

impl RunSummary {
    pub fn from_suites(started_at: DateTime<Utc>, duration_ms: u64, suites: Vec<SuiteResult>) -> Self {
        let cases = suites.iter().flat_map(|s| s.cases.iter());
        let (mut passed, mut failed, mut skipped) = (0, 0, 0);
        for case in cases {
            if case.skipped {
                skipped += 1;
            } else if case.success {
                passed += 1;
            } else {
                failed += 1;
            }
        }

        Self {
            started_at,
            total: passed + failed + skipped,
            passed,
            failed,
            skipped,
            duration_ms,
            suites,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Which suites and cases to run
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub tag: Option<String>,
    pub suite: Option<String>,
    pub case: Option<String>,
}

impl Filter {
    pub fn matches_suite(&self, suite: &Suite) -> bool {
        self.tag.as_ref().map_or(true, |t| suite.tags.contains(t))
            && self.suite.as_ref().map_or(true, |n| &suite.name == n)
    }

    pub fn matches_case(&self, case: &TestCase) -> bool {
        self.case.as_ref().map_or(true, |n| &case.name == n)
    }
}

/// Main E2E test runner
pub struct TestRunner {
    /// Frontend configuration
    app_config: AppConfig,

    /// Playwright configuration
    playwright_config: PlaywrightConfig,

    /// Suite directory; the built-in suites are used when unset
    specs_dir: Option<PathBuf>,

    /// Output directory for results
    output_dir: PathBuf,

    check_readiness: bool,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        let mut playwright_config = config.playwright;
        playwright_config.base_url = config.app.base_url.clone();

        Self {
            app_config: config.app,
            playwright_config,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
            check_readiness: config.check_readiness,
        }
    }

    /// Verify Playwright is installed and the frontend answers
    pub async fn prepare(&self) -> E2eResult<()> {
        PlaywrightHandle::new(self.playwright_config.clone())?
            .check_installed()
            .await?;

        if self.check_readiness {
            AppUnderTest::new(self.app_config.clone())
                .wait_until_ready()
                .await?;
        }
        Ok(())
    }

    /// Suites from the specs directory, or the built-in ones
    pub fn load_suites(&self) -> E2eResult<Vec<Suite>> {
        match &self.specs_dir {
            Some(dir) => Suite::load_all(dir),
            None => Suite::builtin(),
        }
    }

    /// Run every suite and case accepted by `filter`
    pub async fn run(&self, filter: &Filter) -> E2eResult<RunSummary> {
        let suites = self.load_suites()?;
        self.run_suites(&suites, filter).await
    }

    /// Run suites strictly one case at a time
    pub async fn run_suites(&self, suites: &[Suite], filter: &Filter) -> E2eResult<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        let selected: Vec<&Suite> = suites.iter().filter(|s| filter.matches_suite(s)).collect();
        info!("Running {} suite(s)...", selected.len());

        let mut results = Vec::with_capacity(selected.len());
        for suite in selected {
            let playwright = self.playwright_for(suite)?;
            results.push(self.run_suite(&playwright, suite, filter).await);
        }

        let summary = RunSummary::from_suites(started_at, start.elapsed().as_millis() as u64, results);

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            summary.passed, summary.failed, summary.skipped, summary.duration_ms
        );

        Ok(summary)
    }

    /// Browser settings for a suite, honouring its viewport override
    fn playwright_for(&self, suite: &Suite) -> E2eResult<PlaywrightHandle> {
        let mut config = self.playwright_config.clone();
        if let Some(viewport) = suite.viewport {
            config.viewport_width = viewport.width;
            config.viewport_height = viewport.height;
        }
        PlaywrightHandle::new(config)
    }

    async fn run_suite(&self, playwright: &PlaywrightHandle, suite: &Suite, filter: &Filter) -> SuiteResult {
        let start = Instant::now();
        info!("{}", suite.name);

        let mut cases = Vec::new();
        for case in suite.cases.iter().filter(|c| filter.matches_case(c)) {
            let result = self.run_case(playwright, suite, case).await;
            if result.skipped {
                info!("  - {} (skipped)", result.name);
            } else if result.success {
                info!("  ✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "  ✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            cases.push(result);
        }

        SuiteResult {
            name: suite.name.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
            cases,
        }
    }

    /// Run one case in its own browser; errors become a failed result
    pub async fn run_case(&self, playwright: &PlaywrightHandle, suite: &Suite, case: &TestCase) -> TestResult {
        let start = Instant::now();

        if case.skip {
            return TestResult {
                name: case.name.clone(),
                success: true,
                skipped: true,
                duration_ms: 0,
                id: None,
                steps: vec![],
                error: None,
                failure_screenshot: None,
            };
        }

        let mut bindings = Bindings::fresh();
        let id = bindings.id();
        debug!("Running case '{}' with id {:?}", case.name, id);

        let label = format!("{} {}", suite.name, case.name);
        let outcome = match suite.render_case(case, &mut bindings) {
            Ok(steps) => playwright.execute_case(&label, &steps).await,
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(outcome) => TestResult {
                name: case.name.clone(),
                success: outcome.success(),
                skipped: false,
                duration_ms,
                id,
                steps: outcome.steps,
                error: outcome.error,
                failure_screenshot: outcome
                    .failure_screenshot
                    .map(|p| p.to_string_lossy().to_string()),
            },
            Err(e) => TestResult {
                name: case.name.clone(),
                success: false,
                skipped: false,
                duration_ms,
                id,
                steps: vec![],
                error: Some(e.to_string()),
                failure_screenshot: None,
            },
        }
    }

    /// Write the run summary to `test-results.json`
    pub fn write_results(&self, summary: &RunSummary) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub app: AppConfig,
    pub playwright: PlaywrightConfig,
    pub specs_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub check_readiness: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            playwright: PlaywrightConfig::default(),
            specs_dir: None,
            output_dir: PathBuf::from("test-results"),
            check_readiness: true,
        }
    }
}
