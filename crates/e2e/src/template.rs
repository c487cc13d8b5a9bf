//! Per-case placeholder bindings (`{id}`, `{user.full_name}`, ...)

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{E2eError, E2eResult};
use crate::user::random_id;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("valid regex"))
}

/// Values substituted into step strings for one test case
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    /// Bindings with a freshly drawn `id`
    pub fn fresh() -> Self {
        Self::with_id(random_id())
    }

    pub fn with_id(id: u32) -> Self {
        let mut bindings = Self::default();
        bindings.set("id", id.to_string());
        bindings
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The case id, if one was drawn
    pub fn id(&self) -> Option<u32> {
        self.get("id").and_then(|v| v.parse().ok())
    }

    /// Substitute every `{name}` in `input`; `step` only labels errors.
    pub fn render(&self, input: &str, step: &str) -> E2eResult<String> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;

        for caps in placeholder().captures_iter(input) {
            let whole = caps.get(0).expect("group 0 always present");
            let name = &caps[1];
            let value = self.get(name).ok_or_else(|| E2eError::UnboundPlaceholder {
                name: name.to_string(),
                step: step.to_string(),
            })?;
            out.push_str(&input[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }

        out.push_str(&input[last..]);
        Ok(out)
    }

    pub fn render_opt(&self, input: Option<&String>, step: &str) -> E2eResult<Option<String>> {
        input.map(|s| self.render(s, step)).transpose()
    }
}
