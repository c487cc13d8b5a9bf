//! Playwright browser automation
//!
//! Each test case becomes one Node script: a fresh browser and context, the
//! case's steps in order, and one JSON line per step on stdout. The script
//! stops at the first failing step.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::spec::TestStep;
use crate::user::{LoginForm, SignupForm};

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// One line of the script's stdout protocol
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Step {
        /// `None` when the failure happened before the first step
        index: Option<usize>,
        ok: bool,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        error: Option<String>,
    },
    Screenshot {
        path: PathBuf,
    },
    Log {
        message: String,
    },
}

/// Raw output of one `node` run
#[derive(Debug, Clone, Default)]
pub struct ScriptOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// What happened when a case's script ran
#[derive(Debug, Clone, Default)]
pub struct CaseOutcome {
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure_screenshot: Option<PathBuf>,
}

impl CaseOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(mut config: PlaywrightConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;
        // Scripts run from a temp dir, so paths handed to them must be absolute
        config.screenshot_dir = std::fs::canonicalize(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Check that node can resolve the Playwright packages
    pub async fn check_installed(&self) -> E2eResult<()> {
        let status = self
            .node_command()
            .args([
                "-e",
                "require.resolve('playwright'); require.resolve('@playwright/test');",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build, run and summarize one case
    pub async fn execute_case(&self, case_label: &str, steps: &[TestStep]) -> E2eResult<CaseOutcome> {
        let screenshot = self.failure_screenshot_path(case_label);
        let script = self.build_case_script(steps, screenshot.as_deref());
        let output = self.run_script(case_label, &script).await?;
        Ok(summarize(steps, &output))
    }

    fn failure_screenshot_path(&self, case_label: &str) -> Option<PathBuf> {
        self.config.failure_screenshots.then(|| {
            self.config
                .screenshot_dir
                .join("failures")
                .join(format!("{}.png", slug(case_label)))
        })
    }

    /// Build the Playwright script for one case
    pub fn build_case_script(&self, steps: &[TestStep], failure_screenshot: Option<&Path>) -> String {
        let mut script = String::new();

        // Header
        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

const report = (event) => console.log(JSON.stringify(event));
const failureScreenshot = {failure_screenshot};

(async () => {{
  let browser;
  let page;
  let currentStep = null;
  let stepStart = Date.now();
  let exitCode = 0;

  try {{
    browser = await {browser}.launch({{ headless: {headless} }});
    const context = await browser.newContext({{
      viewport: {{ width: {width}, height: {height} }}
    }});
    page = await context.newPage();
    page.setDefaultTimeout({command_timeout});
    page.setDefaultNavigationTimeout({navigation_timeout});
"#,
            failure_screenshot = failure_screenshot
                .map(|p| js_str(&p.to_string_lossy()))
                .unwrap_or_else(|| "null".to_string()),
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            command_timeout = self.config.command_timeout_ms,
            navigation_timeout = self.config.navigation_timeout_ms,
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&format!("    currentStep = {};\n    stepStart = Date.now();\n", i));
            script.push_str(&self.step_to_js(step));
            script.push_str(&format!(
                "\n    report({{ event: 'step', index: {}, ok: true, duration_ms: Date.now() - stepStart }});\n",
                i
            ));
        }

        // Footer
        script.push_str(
            r#"
  } catch (error) {
    exitCode = 1;
    report({ event: 'step', index: currentStep, ok: false, duration_ms: Date.now() - stepStart, error: error.message });
    if (page && failureScreenshot) {
      try {
        await page.screenshot({ path: failureScreenshot, fullPage: true });
        report({ event: 'screenshot', path: failureScreenshot });
      } catch (_) {}
    }
  } finally {
    if (browser) {
      await browser.close();
    }
  }
  process.exitCode = exitCode;
})();
"#,
        );

        script
    }

    /// Convert a step to JavaScript code, expanding form helpers
    fn step_to_js(&self, step: &TestStep) -> String {
        match step {
            TestStep::CreateAccount { user } => self
                .config
                .signup
                .steps_for(&user.to_user())
                .iter()
                .map(|s| self.step_to_js(s))
                .collect::<Vec<_>>()
                .join("\n"),
            TestStep::Login { username, password } => self
                .config
                .login
                .steps_for(username, password)
                .iter()
                .map(|s| self.step_to_js(s))
                .collect::<Vec<_>>()
                .join("\n"),
            TestStep::Navigate { url, wait_for_selector } => {
                let wait = wait_for_selector
                    .as_ref()
                    .map(|s| format!("\n    await page.waitForSelector({});", js_str(s)))
                    .unwrap_or_default();
                format!("    await page.goto({});{}", js_str(&self.resolve_url(url)), wait)
            }
            TestStep::Click { selector, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(self.config.command_timeout_ms);
                format!("    await page.click({}, {{ timeout: {} }});", js_str(selector), timeout)
            }
            TestStep::Fill { selector, value } => {
                format!("    await page.fill({}, {});", js_str(selector), js_str(value))
            }
            TestStep::Select { selector, value } => {
                format!("    await page.selectOption({}, {});", js_str(selector), js_str(value))
            }
            TestStep::Submit { selector } => format!(
                r#"    await Promise.all([
      page.waitForNavigation(),
      page.locator({}).evaluate((form) => form.requestSubmit()),
    ]);"#,
                js_str(selector)
            ),
            TestStep::Press { selector, key } => match selector {
                Some(sel) => format!("    await page.locator({}).press({});", js_str(sel), js_str(key)),
                None => format!("    await page.keyboard.press({});", js_str(key)),
            },
            TestStep::Wait { selector, timeout_ms, state } => format!(
                "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
                js_str(selector),
                state.as_str(),
                timeout_ms
            ),
            TestStep::Assert { selector, visible, text, text_contains, count, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(self.config.command_timeout_ms);
                let locator = format!("page.locator({})", js_str(selector));
                let mut assertions = Vec::new();

                if let Some(vis) = visible {
                    let matcher = if *vis { "toBeVisible" } else { "toBeHidden" };
                    assertions.push(format!(
                        "    await expect({}.first()).{}({{ timeout: {} }});",
                        locator, matcher, timeout
                    ));
                }

                if let Some(t) = text {
                    assertions.push(format!(
                        "    await expect({}.first()).toHaveText({}, {{ timeout: {} }});",
                        locator,
                        js_str(t),
                        timeout
                    ));
                }

                if let Some(tc) = text_contains {
                    assertions.push(format!(
                        "    await expect({}.first()).toContainText({}, {{ timeout: {} }});",
                        locator,
                        js_str(tc),
                        timeout
                    ));
                }

                if let Some(c) = count {
                    assertions.push(format!(
                        "    await expect({}).toHaveCount({}, {{ timeout: {} }});",
                        locator, c, timeout
                    ));
                }

                // Bare assert: the element must exist
                if assertions.is_empty() {
                    assertions.push(format!(
                        "    await expect({}.first()).toBeAttached({{ timeout: {} }});",
                        locator, timeout
                    ));
                }

                assertions.join("\n")
            }
            TestStep::AssertUrl { contains, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(self.config.command_timeout_ms);
                let needle = js_str(contains);
                format!(
                    r#"    await page.waitForURL((url) => url.href.includes({needle}), {{ timeout: {timeout} }})
      .catch((e) => {{ throw new Error(`expected URL to contain ${{{needle}}} but was ${{page.url()}}: ${{e.message}}`); }});"#,
                )
            }
            TestStep::Screenshot { name, selector, full_page } => {
                let path = self.config.screenshot_dir.join(format!("{}.png", slug(name)));
                let path = js_str(&path.to_string_lossy());
                match selector {
                    Some(sel) => format!("    await page.locator({}).screenshot({{ path: {} }});", js_str(sel), path),
                    None => format!("    await page.screenshot({{ path: {}, fullPage: {} }});", path, full_page),
                }
            }
            TestStep::Log { message } => {
                format!("    report({{ event: 'log', message: {} }});", js_str(message))
            }
        }
    }

    /// Join a relative path onto the base URL; absolute URLs pass through
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        if url.starts_with('/') {
            format!("{}{}", base, url)
        } else {
            format!("{}/{}", base, url)
        }
    }

    fn node_command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.config.node_binary);
        if let Some(node_modules) = &self.config.node_modules {
            cmd.env("NODE_PATH", node_modules);
        }
        cmd
    }

    /// Execute a script via node, bounded by the case timeout
    pub async fn run_script(&self, case_label: &str, script: &str) -> E2eResult<ScriptOutput> {
        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("case.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let child = self
            .node_command()
            .arg(&script_path)
            .current_dir(temp_dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.config.case_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("Case '{}' exceeded {:?}, killing node", case_label, self.config.case_timeout);
                E2eError::Timeout(format!("case '{}' after {:?}", case_label, self.config.case_timeout))
            })??;

        Ok(ScriptOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Parse the JSON event lines of a script's stdout, skipping anything else
pub fn parse_events(stdout: &str) -> Vec<ScriptEvent> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ScriptEvent>(line) {
            Ok(event) => Some(event),
            Err(_) => {
                debug!("[node] {}", line);
                None
            }
        })
        .collect()
}

/// Turn a script run into per-step results and a case error
pub fn summarize(steps: &[TestStep], output: &ScriptOutput) -> CaseOutcome {
    let mut outcome = CaseOutcome::default();

    for event in parse_events(&output.stdout) {
        match event {
            ScriptEvent::Step { index, ok, duration_ms, error } => {
                let Some(step) = index.and_then(|i| steps.get(i)) else {
                    if !ok {
                        outcome.error = Some(format!(
                            "setup failed: {}",
                            error.unwrap_or_else(|| "unknown error".to_string())
                        ));
                    }
                    continue;
                };
                let step_name = step.name();
                if !ok && outcome.error.is_none() {
                    outcome.error = Some(format!(
                        "{} - {}",
                        step_name,
                        error.as_deref().unwrap_or("unknown error")
                    ));
                }
                outcome.steps.push(StepResult {
                    success: ok,
                    step_name,
                    duration_ms,
                    error,
                });
            }
            ScriptEvent::Screenshot { path } => {
                outcome.failure_screenshot = Some(path);
            }
            ScriptEvent::Log { message } => {
                info!("[TEST LOG] {}", message);
            }
        }
    }

    if outcome.error.is_none() {
        if !output.success {
            outcome.error = Some(format!("Script failed:\nstderr: {}", output.stderr.trim()));
        } else if outcome.steps.len() < steps.len() {
            outcome.error = Some(format!(
                "Script ended after {} of {} steps",
                outcome.steps.len(),
                steps.len()
            ));
        }
    }

    outcome
}

/// Encode a string as a JavaScript string literal
pub fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// File-name-safe form of a label
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,

    /// Timeout for clicks and assertions
    pub command_timeout_ms: u64,

    /// Timeout for page loads
    pub navigation_timeout_ms: u64,

    /// Upper bound for one case's node process
    pub case_timeout: Duration,

    pub node_binary: PathBuf,

    /// Exported as NODE_PATH so the temp script resolves `playwright`
    pub node_modules: Option<PathBuf>,

    pub failure_screenshots: bool,

    pub signup: SignupForm,
    pub login: LoginForm,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            command_timeout_ms: 4000,
            navigation_timeout_ms: 60_000,
            case_timeout: Duration::from_secs(120),
            node_binary: PathBuf::from("node"),
            node_modules: None,
            failure_screenshots: true,
            signup: SignupForm::default(),
            login: LoginForm::default(),
        }
    }
}
