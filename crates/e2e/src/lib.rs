//! BuildProbe E2E Test Framework
//!
//! Runs API and browser scenarios against a live build server:
//! - Generates a fresh, related data set per scenario
//! - Talks to the REST API through checked and unchecked requesters
//! - Drives the web UI through Playwright page objects
//! - Deletes everything a scenario created, whatever its outcome
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  E2E Test Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── select(name | tag) -> [Scenario]                     │
//! │    ├── AuthSettingsFixture (api scenarios)                  │
//! │    └── run_scenario(Scenario) -> TestResult                 │
//! │          ├── TestContext::begin   (generate_all, ledger)    │
//! │          ├── Scenario::run        (API + UiSession)         │
//! │          └── TestContext::finish  (drain ledger)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UiSession                                                  │
//! │    ├── page objects queue UiSteps                           │
//! │    └── run() -> Playwright script -> Captures               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod context;
pub mod error;
pub mod pages;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod server;

pub use context::TestContext;
pub use error::{E2eError, E2eResult};
pub use runner::{Scenario, TestRunner};
pub use server::ServerProbe;
