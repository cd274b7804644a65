//! Scenario runner: selection, per-test context, cleanup and reporting

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use buildprobe_api::{AuthSettingsFixture, ProbeConfig, RequestSpec};

use crate::context::TestContext;
use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// Tag carried by scenarios that need per-project permissions on the server
pub const API_TAG: &str = "api";

#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    fn tags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Browsers the scenario can run on; empty means any
    fn browsers(&self) -> &'static [Browser] {
        &[]
    }

    async fn run(&self, ctx: &mut TestContext) -> anyhow::Result<()>;
}

fn supports(scenario: &dyn Scenario, browser: Browser) -> bool {
    let browsers = scenario.browsers();
    browsers.is_empty() || browsers.contains(&browser)
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub skipped: bool,
    pub duration_ms: u64,
    /// Entities removed by the post-test cleanup
    pub cleaned_up: usize,
    pub error: Option<String>,
}

impl TestResult {
    fn skipped(name: &str, reason: String) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            skipped: true,
            duration_ms: 0,
            cleaned_up: 0,
            error: Some(reason),
        }
    }
}

/// Result of running all selected scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub probe: ProbeConfig,
    pub output_dir: PathBuf,
    /// Toggle per-project permissions around runs that include API scenarios
    pub manage_auth_settings: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            output_dir: PathBuf::from("test-results"),
            manage_auth_settings: true,
        }
    }
}

/// Runs scenarios one after another on the current worker
pub struct TestRunner {
    probe: ProbeConfig,
    browser: Browser,
    output_dir: PathBuf,
    manage_auth_settings: bool,
}

impl TestRunner {
    pub fn with_config(config: RunnerConfig) -> E2eResult<Self> {
        Ok(Self {
            browser: config.probe.browser.parse()?,
            probe: config.probe,
            output_dir: config.output_dir,
            manage_auth_settings: config.manage_auth_settings,
        })
    }

    pub fn browser(&self) -> Browser {
        self.browser
    }

    /// Pick scenarios by exact name or by tag; no filter selects everything
    pub fn select<'a>(
        &self,
        scenarios: &'a [Box<dyn Scenario>],
        name: Option<&str>,
        tag: Option<&str>,
    ) -> E2eResult<Vec<&'a dyn Scenario>> {
        if let Some(name) = name {
            return scenarios
                .iter()
                .find(|s| s.name() == name)
                .map(|s| vec![s.as_ref()])
                .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()));
        }

        Ok(scenarios
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| tag.map_or(true, |tag| s.tags().contains(&tag)))
            .collect())
    }

    /// Run a list of scenarios
    pub async fn run_scenarios(&self, scenarios: &[&dyn Scenario]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        let runnable: Vec<&dyn Scenario> = scenarios
            .iter()
            .copied()
            .filter(|s| supports(*s, self.browser))
            .collect();
        let fixture = if self.manage_auth_settings && runnable.iter().any(|s| s.tags().contains(&API_TAG)) {
            Some(AuthSettingsFixture::enable(RequestSpec::super_user(&self.probe)?).await?)
        } else {
            None
        };

        info!("Running {} test(s) in {}...", scenarios.len(), self.browser);

        for scenario in scenarios {
            if !supports(*scenario, self.browser) {
                let supported: Vec<&str> = scenario.browsers().iter().map(|b| b.name()).collect();
                let reason = format!(
                    "runs on {} only, configured browser is {}",
                    supported.join(", "),
                    self.browser
                );
                warn!("- {} skipped: {}", scenario.name(), reason);
                skipped += 1;
                results.push(TestResult::skipped(scenario.name(), reason));
                continue;
            }

            let result = self.run_scenario(*scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        if let Some(fixture) = fixture {
            if let Err(e) = fixture.restore().await {
                error!("Failed to restore server auth settings: {}", e);
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms);

        Ok(TestSuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run one scenario in a fresh context; cleanup runs even when the body fails
    pub async fn run_scenario(&self, scenario: &dyn Scenario) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", scenario.name());

        let mut ctx = match TestContext::begin(&self.probe) {
            Ok(ctx) => ctx,
            Err(e) => {
                return TestResult {
                    name: scenario.name().to_string(),
                    success: false,
                    skipped: false,
                    duration_ms: start.elapsed().as_millis() as u64,
                    cleaned_up: 0,
                    error: Some(format!("setup failed: {}", e)),
                }
            }
        };

        let outcome = scenario.run(&mut ctx).await;
        let cleanup = ctx.finish().await;

        let mut errors = Vec::new();
        if let Err(e) = &outcome {
            errors.push(format!("{:#}", e));
        }
        let cleaned_up = match cleanup {
            Ok(count) => count,
            Err(e) => {
                errors.push(format!("cleanup: {}", e));
                0
            }
        };

        TestResult {
            name: scenario.name().to_string(),
            success: errors.is_empty(),
            skipped: false,
            duration_ms: start.elapsed().as_millis() as u64,
            cleaned_up,
            error: (!errors.is_empty()).then(|| errors.join("; ")),
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
