//! Ephemeral bank users created through the signup form

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::spec::TestStep;
use crate::template::Bindings;

/// Upper bound (inclusive) for the random suffix appended to generated users
pub const MAX_USER_ID: u32 = 1_000_000;

/// Draw a fresh suffix in `0..=MAX_USER_ID`.
///
/// Collisions across runs are possible, just unlikely.
pub fn random_id() -> u32 {
    rand::thread_rng().gen_range(0..=MAX_USER_ID)
}

/// A concrete user record, valid for a single test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl TestUser {
    /// The default demo user: `user-{id}` / `Tom` / `Nook-{id}` / `bells`
    pub fn with_id(id: u32) -> Self {
        Self {
            username: format!("user-{}", id),
            first_name: "Tom".to_string(),
            last_name: format!("Nook-{}", id),
            password: "bells".to_string(),
        }
    }

    /// Name as the account dropdown shows it
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Make this user's fields available as `user.*` placeholders
    pub fn bind(&self, bindings: &mut Bindings) {
        bindings.set("user.username", &self.username);
        bindings.set("user.first_name", &self.first_name);
        bindings.set("user.last_name", &self.last_name);
        bindings.set("user.password", &self.password);
        bindings.set("user.full_name", self.full_name());
    }
}

/// User record as written in a suite file; fields may contain placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTemplate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl Default for UserTemplate {
    fn default() -> Self {
        Self {
            username: "user-{id}".to_string(),
            first_name: "Tom".to_string(),
            last_name: "Nook-{id}".to_string(),
            password: "bells".to_string(),
        }
    }
}

impl UserTemplate {
    pub fn render(&self, bindings: &Bindings, step: &str) -> E2eResult<TestUser> {
        Ok(TestUser {
            username: bindings.render(&self.username, step)?,
            first_name: bindings.render(&self.first_name, step)?,
            last_name: bindings.render(&self.last_name, step)?,
            password: bindings.render(&self.password, step)?,
        })
    }

    /// Treat the template's fields as literal values.
    ///
    /// Only meaningful once the template has been rendered.
    pub fn to_user(&self) -> TestUser {
        TestUser {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            password: self.password.clone(),
        }
    }
}

impl From<TestUser> for UserTemplate {
    fn from(user: TestUser) -> Self {
        Self {
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            password: user.password,
        }
    }
}

/// Selectors of the signup page
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub path: String,
    pub username: String,
    pub password: String,
    pub password_repeat: String,
    pub first_name: String,
    pub last_name: String,
    pub form: String,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            path: "/signup".to_string(),
            username: "#signup-username".to_string(),
            password: "#signup-password".to_string(),
            password_repeat: "#signup-password-repeat".to_string(),
            first_name: "#signup-firstname".to_string(),
            last_name: "#signup-lastname".to_string(),
            form: "#signup-form".to_string(),
        }
    }
}

impl SignupForm {
    /// Primitive steps that register `user`.
    ///
    /// Fields not listed here (birthday, address, ...) keep the defaults the
    /// frontend prefills.
    pub fn steps_for(&self, user: &TestUser) -> Vec<TestStep> {
        vec![
            TestStep::Navigate {
                url: self.path.clone(),
                wait_for_selector: Some(self.form.clone()),
            },
            fill(&self.username, &user.username),
            fill(&self.password, &user.password),
            fill(&self.password_repeat, &user.password),
            fill(&self.first_name, &user.first_name),
            fill(&self.last_name, &user.last_name),
            TestStep::Submit {
                selector: self.form.clone(),
            },
        ]
    }
}

/// Selectors of the login page
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub path: String,
    pub username: String,
    pub password: String,
    pub form: String,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            path: "/login".to_string(),
            username: "#login-username".to_string(),
            password: "#login-password".to_string(),
            form: "#login-form".to_string(),
        }
    }
}

impl LoginForm {
    pub fn steps_for(&self, username: &str, password: &str) -> Vec<TestStep> {
        vec![
            TestStep::Navigate {
                url: self.path.clone(),
                wait_for_selector: Some(self.form.clone()),
            },
            fill(&self.username, username),
            fill(&self.password, password),
            TestStep::Submit {
                selector: self.form.clone(),
            },
        ]
    }
}

fn fill(selector: &str, value: &str) -> TestStep {
    TestStep::Fill {
        selector: selector.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_in_range() {
        for _ in 0..1000 {
            assert!(random_id() <= MAX_USER_ID);
        }
    }

    #[test]
    fn test_user_with_id() {
        let user = TestUser::with_id(42);
        assert_eq!(user.username, "user-42");
        assert_eq!(user.first_name, "Tom");
        assert_eq!(user.last_name, "Nook-42");
        assert_eq!(user.password, "bells");
        assert_eq!(user.full_name(), "Tom Nook-42");
    }

    #[test]
    fn test_default_template_renders_default_user() {
        let bindings = Bindings::with_id(7);
        let user = UserTemplate::default().render(&bindings, "create_account").unwrap();
        assert_eq!(user, TestUser::with_id(7));
    }

    #[test]
    fn test_bind_exposes_full_name() {
        let mut bindings = Bindings::with_id(3);
        TestUser::with_id(3).bind(&mut bindings);
        assert_eq!(
            bindings.render("{user.full_name}", "assert").unwrap(),
            "Tom Nook-3"
        );
    }

    #[test]
    fn test_signup_steps_fill_password_twice_and_submit() {
        let steps = SignupForm::default().steps_for(&TestUser::with_id(1));
        assert_eq!(steps.len(), 7);

        let filled: Vec<(&str, &str)> = steps
            .iter()
            .filter_map(|s| match s {
                TestStep::Fill { selector, value } => Some((selector.as_str(), value.as_str())),
                _ => None,
            })
            .collect();
        assert!(filled.contains(&("#signup-password", "bells")));
        assert!(filled.contains(&("#signup-password-repeat", "bells")));
        assert!(filled.contains(&("#signup-lastname", "Nook-1")));

        assert!(matches!(
            steps.last(),
            Some(TestStep::Submit { selector }) if selector == "#signup-form"
        ));
    }

    #[test]
    fn test_login_steps() {
        let steps = LoginForm::default().steps_for("user-9", "bells");
        assert!(matches!(
            &steps[0],
            TestStep::Navigate { url, .. } if url == "/login"
        ));
        assert_eq!(steps.len(), 4);
    }
}
