//! Declarative YAML suite specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::template::Bindings;
use crate::user::UserTemplate;

const NAVIGATION_SUITE: &str = include_str!("../specs/navigation.yaml");
const CREATE_ACCOUNT_SUITE: &str = include_str!("../specs/create_account.yaml");

/// A named group of related test cases, parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    /// Unique name for this suite
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering suites
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser, overriding the runner's
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Setup steps re-run before every case
    #[serde(default)]
    pub before_each: Vec<TestStep>,

    /// Independent test cases, run in order
    pub cases: Vec<TestCase>,
}

/// One independent, ordered sequence of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    /// Skipped cases are reported but never executed
    #[serde(default)]
    pub skip: bool,

    pub steps: Vec<TestStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        selector: String,
        value: String,
    },

    /// Select an option from a dropdown
    Select {
        selector: String,
        value: String,
    },

    /// Submit a form and wait for the resulting navigation
    Submit {
        selector: String,
    },

    /// Press a key
    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to reach a state
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert the current URL contains a substring
    AssertUrl {
        contains: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },

    /// Register a new account through the signup form
    CreateAccount {
        #[serde(default)]
        user: UserTemplate,
    },

    /// Sign in through the login form
    Login {
        username: String,
        password: String,
    },
}

fn default_wait_timeout() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl TestStep {
    /// Short label used in logs and reports
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Fill { selector, .. } => format!("fill:{}", selector),
            TestStep::Select { selector, .. } => format!("select:{}", selector),
            TestStep::Submit { selector } => format!("submit:{}", selector),
            TestStep::Press { key, .. } => format!("press:{}", key),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Assert { selector, .. } => format!("assert:{}", selector),
            TestStep::AssertUrl { contains, .. } => format!("assert_url:{}", contains),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
            TestStep::CreateAccount { user } => format!("create_account:{}", user.username),
            TestStep::Login { username, .. } => format!("login:{}", username),
        }
    }

    /// Substitute placeholders in every string field
    pub fn render(&self, bindings: &Bindings) -> E2eResult<TestStep> {
        let name = self.name();
        let r = |s: &String| bindings.render(s, &name);
        let ro = |s: &Option<String>| bindings.render_opt(s.as_ref(), &name);

        let step = match self {
            TestStep::Navigate { url, wait_for_selector } => TestStep::Navigate {
                url: r(url)?,
                wait_for_selector: ro(wait_for_selector)?,
            },
            TestStep::Click { selector, timeout_ms } => TestStep::Click {
                selector: r(selector)?,
                timeout_ms: *timeout_ms,
            },
            TestStep::Fill { selector, value } => TestStep::Fill {
                selector: r(selector)?,
                value: r(value)?,
            },
            TestStep::Select { selector, value } => TestStep::Select {
                selector: r(selector)?,
                value: r(value)?,
            },
            TestStep::Submit { selector } => TestStep::Submit { selector: r(selector)? },
            TestStep::Press { selector, key } => TestStep::Press {
                selector: ro(selector)?,
                key: r(key)?,
            },
            TestStep::Wait { selector, timeout_ms, state } => TestStep::Wait {
                selector: r(selector)?,
                timeout_ms: *timeout_ms,
                state: *state,
            },
            TestStep::Assert { selector, visible, text, text_contains, count, timeout_ms } => {
                TestStep::Assert {
                    selector: r(selector)?,
                    visible: *visible,
                    text: ro(text)?,
                    text_contains: ro(text_contains)?,
                    count: *count,
                    timeout_ms: *timeout_ms,
                }
            }
            TestStep::AssertUrl { contains, timeout_ms } => TestStep::AssertUrl {
                contains: r(contains)?,
                timeout_ms: *timeout_ms,
            },
            TestStep::Screenshot { name: shot, selector, full_page } => TestStep::Screenshot {
                name: r(shot)?,
                selector: ro(selector)?,
                full_page: *full_page,
            },
            TestStep::Log { message } => TestStep::Log { message: r(message)? },
            TestStep::CreateAccount { user } => TestStep::CreateAccount {
                user: UserTemplate::from(user.render(bindings, &name)?),
            },
            TestStep::Login { username, password } => TestStep::Login {
                username: r(username)?,
                password: r(password)?,
            },
        };

        Ok(step)
    }
}

impl Suite {
    /// Parse a suite from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let suite: Suite = serde_yaml::from_str(yaml)?;
        if suite.cases.is_empty() {
            return Err(E2eError::SpecParse(format!("Suite '{}' has no cases", suite.name)));
        }
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all suites from a directory, ordered by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut suites = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            suites.push(Self::from_file(entry.path())?);
        }

        Ok(suites)
    }

    /// The suites shipped with this crate: navigation, then account creation
    pub fn builtin() -> E2eResult<Vec<Self>> {
        Ok(vec![
            Self::from_yaml(NAVIGATION_SUITE)?,
            Self::from_yaml(CREATE_ACCOUNT_SUITE)?,
        ])
    }

    /// Render `before_each` followed by the case's own steps.
    ///
    /// A `create_account` step binds `user.*` for every step after it.
    pub fn render_case(&self, case: &TestCase, bindings: &mut Bindings) -> E2eResult<Vec<TestStep>> {
        let mut rendered = Vec::with_capacity(self.before_each.len() + case.steps.len());

        for step in self.before_each.iter().chain(case.steps.iter()) {
            let step = step.render(bindings)?;
            if let TestStep::CreateAccount { user } = &step {
                user.to_user().bind(bindings);
            }
            rendered.push(step);
        }

        Ok(rendered)
    }
}
