//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Application not ready at {url} after {attempts} attempts")]
    AppNotReady { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npm install playwright @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Unbound placeholder '{{{name}}}' in step: {step}")]
    UnboundPlaceholder { name: String, step: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_placeholder_message_keeps_braces() {
        let err = E2eError::UnboundPlaceholder {
            name: "user.full_name".to_string(),
            step: "assert:#accountDropdown".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unbound placeholder '{user.full_name}' in step: assert:#accountDropdown"
        );
    }
}
