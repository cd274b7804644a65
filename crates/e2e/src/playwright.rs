//! Playwright browser automation
//!
//! A flow of [`UiStep`]s is rendered into a standalone Node script, run with
//! `node` and judged by the JSON line the script prints last. Values read
//! from the page (link targets, the current URL) come back as [`Captures`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::Deserialize;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use buildprobe_api::ProbeConfig;

use crate::error::{E2eError, E2eResult};

/// Default wait for an element to appear
pub const BASE_TIMEOUT_MS: u64 = 30_000;

/// Wait used for slow server-side work such as finishing a build
pub const LONG_TIMEOUT_MS: u64 = 180_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    /// Name of the Playwright browser type
    fn launcher(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    /// Name used in configuration and scenario browser lists
    pub fn name(&self) -> &'static str {
        match self {
            Browser::Chromium => "chrome",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::UnknownBrowser(other.to_string())),
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single browser action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiStep {
    /// Open a path relative to the server root
    Navigate { path: String },
    /// Wait for the first match of `selector` to become visible
    WaitFor { selector: String, timeout_ms: u64 },
    Fill { selector: String, value: String },
    Click { selector: String },
    /// Click the element matching `selector` whose whole text is `text`
    ClickText { selector: String, text: String },
    /// Hover the `container` match containing `text`, then click `target` inside it
    HoverAndClick {
        container: String,
        text: String,
        target: String,
    },
    /// Type key by key, for editors that ignore `fill`
    Type { selector: String, text: String },
    /// Assert the exact text of the first match
    ExpectText {
        selector: String,
        text: String,
        timeout_ms: u64,
    },
    /// Store an attribute of the first match under `name`
    CaptureAttribute {
        name: String,
        selector: String,
        attribute: String,
    },
    /// Store the current page URL under `name`
    CaptureUrl { name: String },
}

impl UiStep {
    /// Short label for logs and failure reports
    pub fn describe(&self) -> String {
        match self {
            UiStep::Navigate { path } => format!("navigate:{}", path),
            UiStep::WaitFor { selector, .. } => format!("wait:{}", selector),
            UiStep::Fill { selector, .. } => format!("fill:{}", selector),
            UiStep::Click { selector } => format!("click:{}", selector),
            UiStep::ClickText { selector, text } => format!("click:{}[{}]", selector, text),
            UiStep::HoverAndClick { container, text, target } => {
                format!("hover:{}[{}] click:{}", container, text, target)
            }
            UiStep::Type { selector, .. } => format!("type:{}", selector),
            UiStep::ExpectText { selector, text, .. } => format!("expect:{}={}", selector, text),
            UiStep::CaptureAttribute { name, .. } => format!("capture:{}", name),
            UiStep::CaptureUrl { name } => format!("capture:{}", name),
        }
    }

    fn to_js(&self) -> String {
        match self {
            UiStep::Navigate { path } => {
                format!("    await page.goto(baseUrl + {});", js(path))
            }
            UiStep::WaitFor { selector, timeout_ms } => format!(
                "    await page.locator({}).first().waitFor({{ state: 'visible', timeout: {} }});",
                js(selector),
                timeout_ms
            ),
            UiStep::Fill { selector, value } => {
                format!("    await page.fill({}, {});", js(selector), js(value))
            }
            UiStep::Click { selector } => format!(
                "    await page.locator({}).first().click({{ timeout: {} }});",
                js(selector),
                BASE_TIMEOUT_MS
            ),
            UiStep::ClickText { selector, text } => format!(
                "    await page.locator({}).filter({{ hasText: new RegExp({}) }}).first().click({{ timeout: {} }});",
                js(selector),
                js(&format!("^\\s*{}\\s*$", regex::escape(text))),
                BASE_TIMEOUT_MS
            ),
            UiStep::HoverAndClick { container, text, target } => format!(
                "    {{\n      const item = page.locator({}).filter({{ hasText: {} }}).first();\n      await item.hover({{ timeout: {} }});\n      await item.locator({}).first().click();\n    }}",
                js(container),
                js(text),
                BASE_TIMEOUT_MS,
                js(target)
            ),
            UiStep::Type { selector, text } => format!(
                "    await page.locator({}).first().pressSequentially({});",
                js(selector),
                js(text)
            ),
            UiStep::ExpectText {
                selector,
                text,
                timeout_ms,
            } => format!(
                "    await expect(page.locator({}).first()).toHaveText({}, {{ timeout: {} }});",
                js(selector),
                js(text),
                timeout_ms
            ),
            UiStep::CaptureAttribute {
                name,
                selector,
                attribute,
            } => format!(
                "    captures[{}] = await page.locator({}).first().getAttribute({});",
                js(name),
                js(selector),
                js(attribute)
            ),
            UiStep::CaptureUrl { name } => format!("    captures[{}] = page.url();", js(name)),
        }
    }
}

/// Render a Rust string as a JavaScript string literal
fn js(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Values read from the page during a run; a capture may be `null`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Captures(HashMap<String, Option<String>>);

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|value| value.as_deref())
    }

    pub fn require(&self, name: &str) -> E2eResult<&str> {
        self.get(name)
            .ok_or_else(|| E2eError::MissingCapture(name.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ScriptOutcome {
    success: bool,
    #[serde(default)]
    captures: Captures,
    #[serde(default)]
    error: Option<String>,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    /// WebSocket endpoint of a remote browser server
    pub remote: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Directory holding the `playwright` node modules
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8111".to_string(),
            browser: Browser::Chromium,
            headless: true,
            remote: None,
            viewport_width: 1920,
            viewport_height: 1080,
            node_path: std::env::var_os("NODE_PATH").map(PathBuf::from),
        }
    }
}

impl PlaywrightConfig {
    pub fn from_probe(config: &ProbeConfig) -> E2eResult<Self> {
        Ok(Self {
            base_url: config.base_url(),
            browser: config.browser.parse()?,
            headless: config.headless,
            remote: config.remote.clone(),
            ..Default::default()
        })
    }
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a handle after checking that Playwright is installed
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        Ok(Self::unchecked(config))
    }

    /// Create a handle without probing the local installation
    pub fn unchecked(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    pub fn browser(&self) -> Browser {
        self.config.browser
    }

    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a set of steps.
    ///
    /// With `storage_state`, cookies are loaded from that file when it exists
    /// and written back after the last step, so consecutive runs share a
    /// login.
    pub fn build_script(&self, steps: &[UiStep], storage_state: Option<&Path>) -> String {
        let launch = match &self.config.remote {
            Some(endpoint) => format!("{}.connect({})", self.config.browser.launcher(), js(endpoint)),
            None => format!(
                "{}.launch({{ headless: {} }})",
                self.config.browser.launcher(),
                self.config.headless
            ),
        };
        let state_path = storage_state
            .map(|path| js(&path.to_string_lossy()))
            .unwrap_or_else(|| "null".to_string());

        let mut script = String::new();

        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');
const fs = require('fs');

(async () => {{
  const browser = await {launch};
  const statePath = {state_path};
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }},
    storageState: statePath && fs.existsSync(statePath) ? statePath : undefined
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  const captures = {{}};

  try {{
"#,
            launch = launch,
            state_path = state_path,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            base_url = js(&self.config.base_url),
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.describe()));
            script.push_str(&step.to_js());
            script.push('\n');
        }

        script.push_str(
            r#"
    if (statePath) {
      await context.storageState({ path: statePath });
    }
    console.log(JSON.stringify({ success: true, captures }));
  } catch (error) {
    console.log(JSON.stringify({ success: false, captures, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Execute steps in a fresh browser context and return what they captured
    pub async fn run(&self, steps: &[UiStep], storage_state: Option<&Path>) -> E2eResult<Captures> {
        let script = self.build_script(steps, storage_state);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("flow.js");
        std::fs::write(&script_path, &script)?;

        debug!(
            "Running Playwright script with {} step(s): {}",
            steps.len(),
            script_path.display()
        );

        let mut command = TokioCommand::new("node");
        command.arg(&script_path).current_dir(temp_dir.path());
        if let Some(node_path) = &self.config.node_path {
            command.env("NODE_PATH", node_path);
        }
        let output = command.output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        match parse_outcome(&stdout) {
            Some(outcome) if outcome.success && output.status.success() => Ok(outcome.captures),
            Some(outcome) => Err(E2eError::StepFailed {
                step: flow_label(steps),
                reason: outcome.error.unwrap_or_else(|| stderr.trim().to_string()),
            }),
            None => Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            ))),
        }
    }
}

/// The outcome is the last JSON line printed by the script
fn parse_outcome(stdout: &str) -> Option<ScriptOutcome> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}

/// Playwright reports the failing call, not our step, so failures name the flow
fn flow_label(steps: &[UiStep]) -> String {
    match steps {
        [] => "empty flow".to_string(),
        [only] => only.describe(),
        [first, .., last] => format!("{} .. {}", first.describe(), last.describe()),
    }
}
