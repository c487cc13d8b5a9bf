//! Bank UI E2E Test Framework
//!
//! This crate provides a Rust-controlled E2E testing framework that:
//! - Waits for the bank frontend to report ready
//! - Parses declarative YAML suites (two are built in)
//! - Drives Playwright by generating one Node script per test case
//! - Registers throwaway users through the signup form
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── prepare()  -> playwright installed, GET /ready       │
//! │    ├── run(filter) -> RunSummary                            │
//! │    │     └── per case: Bindings::fresh() (random id)        │
//! │    │                   Suite::render_case()                 │
//! │    │                   PlaywrightHandle::execute_case()     │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Suite (YAML)                                               │
//! │    ├── name, tags, viewport                                 │
//! │    ├── before_each: [TestStep]                              │
//! │    └── cases: [{ name, skip?, steps: [TestStep] }]          │
//! │          ├── navigate { url }                               │
//! │          ├── click / fill / select / submit / press / wait  │
//! │          ├── assert { selector, text_contains?, ... }       │
//! │          ├── assert_url { contains }                        │
//! │          └── create_account { user } / login { .. }         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod error;
pub mod playwright;
pub mod runner;
pub mod spec;
pub mod template;
pub mod user;

pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use spec::{Suite, TestCase, TestStep};
pub use user::TestUser;
