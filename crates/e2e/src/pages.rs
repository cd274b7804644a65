//! Page objects for the server's web UI
//!
//! Page methods only queue [`UiStep`]s on a [`UiSession`]; nothing touches a
//! browser until [`UiSession::run`]. Ids of entities created through the UI
//! are read from the captures afterwards and recorded in the ledger so the
//! test's cleanup removes them.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::TempDir;
use tracing::{debug, info};

use buildprobe_common::model::{BuildType, Project, User};
use buildprobe_common::random::random_string;
use buildprobe_common::{EntityCategory, SharedLedger};

use crate::error::E2eResult;
use crate::playwright::{Browser, Captures, PlaywrightHandle, UiStep, BASE_TIMEOUT_MS, LONG_TIMEOUT_MS};

const SUBMIT_BUTTON: &str = ".saveButtonsBlock > .submitButton";

const PROJECT_ID_CAPTURE: &str = "projectId";
const BUILD_TYPE_URL_CAPTURE: &str = "buildTypeUrl";
const BUILD_LINK_CAPTURE: &str = "buildLink";

static PROJECT_ID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"projectId=(.*?)(?:&|$)").ok());
static BUILD_TYPE_ID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"buildType:(.*?)(?:&|$)").ok());

/// `[data-test~='value']`: matches one word of a space-separated `data-test`
pub fn by_data_test(value: &str) -> String {
    format!("[data-test~='{}']", value)
}

pub fn by_data_test_itemtype(value: &str) -> String {
    format!("[data-test-itemtype='{}']", value)
}

/// A browser session: queued steps plus the cookies of earlier runs
pub struct UiSession {
    handle: PlaywrightHandle,
    steps: Vec<UiStep>,
    state_dir: TempDir,
}

impl UiSession {
    pub fn new(handle: PlaywrightHandle) -> E2eResult<Self> {
        Ok(Self {
            handle,
            steps: Vec::new(),
            state_dir: tempfile::tempdir()?,
        })
    }

    pub fn browser(&self) -> Browser {
        self.handle.browser()
    }

    pub fn push(&mut self, step: UiStep) {
        self.steps.push(step);
    }

    /// Steps queued since the last run
    pub fn pending(&self) -> &[UiStep] {
        &self.steps
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir.path().join("storage-state.json")
    }

    /// Run the queued steps, keeping cookies for the next run
    pub async fn run(&mut self) -> E2eResult<Captures> {
        let steps = std::mem::take(&mut self.steps);
        debug!("Running {} UI step(s) in {}", steps.len(), self.browser());
        self.handle.run(&steps, Some(&self.state_path())).await
    }

    fn navigate(&mut self, path: impl Into<String>) {
        self.push(UiStep::Navigate { path: path.into() });
    }

    fn wait_for(&mut self, selector: &str, timeout_ms: u64) {
        self.push(UiStep::WaitFor {
            selector: selector.to_string(),
            timeout_ms,
        });
    }

    fn fill(&mut self, selector: &str, value: &str) {
        self.push(UiStep::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        });
    }

    fn click(&mut self, selector: &str) {
        self.push(UiStep::Click {
            selector: selector.to_string(),
        });
    }

    fn expect_text(&mut self, selector: &str, text: &str, timeout_ms: u64) {
        self.push(UiStep::ExpectText {
            selector: selector.to_string(),
            text: text.to_string(),
            timeout_ms,
        });
    }
}

pub struct LoginPage<'a> {
    session: &'a mut UiSession,
}

impl<'a> LoginPage<'a> {
    const LOGIN_URL: &'static str = "/login.html";
    const USERNAME_INPUT: &'static str = "#username";
    const PASSWORD_INPUT: &'static str = "#password";
    const LOGIN_BUTTON: &'static str = ".loginButton";

    pub fn open(session: &'a mut UiSession) -> Self {
        session.navigate(Self::LOGIN_URL);
        Self { session }
    }

    pub fn login(self, user: &User) -> ProjectsPage<'a> {
        self.session.fill(Self::USERNAME_INPUT, user.username_str());
        self.session.fill(Self::PASSWORD_INPUT, user.password_str());
        self.session.click(Self::LOGIN_BUTTON);
        ProjectsPage::new(self.session)
    }
}

pub struct ProjectsPage<'a> {
    session: &'a mut UiSession,
}

impl<'a> ProjectsPage<'a> {
    const PROJECTS_URL: &'static str = "/favorite/projects";
    const SUCCESS_BUILD_STATUS: &'static str = "Success";
    const HEADER: &'static str = ".MainPanel__router--gF > div";
    const EDIT_PROJECT_LINK: &'static str = ".EditEntity__link--en";
    const BUILD_TYPE: &'static str = ".BuildTypeLine__link--MF";
    const BUILD_TYPE_HEADER: &'static str = ".BuildTypePageHeader__heading--De";
    const BUILD_DETAILS_BUTTON: &'static str = ".BuildDetails__button--BC";
    const BUILD_STATUS_LINK: &'static str = ".Build__status--bG > a";

    fn new(session: &'a mut UiSession) -> Self {
        session.wait_for(Self::HEADER, BASE_TIMEOUT_MS);
        Self { session }
    }

    pub fn open(session: &'a mut UiSession) -> Self {
        session.navigate(Self::PROJECTS_URL);
        Self::new(session)
    }

    pub fn verify_project_and_build_type(self, project_name: &str, build_type_name: &str) -> Self {
        self.session.push(UiStep::ClickText {
            selector: by_data_test_itemtype("project"),
            text: project_name.to_string(),
        });
        self.session.wait_for(&by_data_test("run-build"), BASE_TIMEOUT_MS);
        self.session
            .expect_text(Self::BUILD_TYPE, build_type_name, BASE_TIMEOUT_MS);
        self
    }

    pub fn run_build_and_wait_until_it_is_finished(self) -> Self {
        self.session.click(Self::BUILD_TYPE);
        self.session.wait_for(Self::BUILD_TYPE_HEADER, BASE_TIMEOUT_MS);
        self.session.click(&by_data_test("run-build"));
        self.session.wait_for(Self::BUILD_DETAILS_BUTTON, BASE_TIMEOUT_MS);
        self.session.expect_text(
            Self::BUILD_STATUS_LINK,
            Self::SUCCESS_BUILD_STATUS,
            LONG_TIMEOUT_MS,
        );
        self
    }

    /// Read the edit-project link; see [`project_id`]
    pub fn capture_project_id(self) -> Self {
        self.session.push(UiStep::CaptureAttribute {
            name: PROJECT_ID_CAPTURE.to_string(),
            selector: Self::EDIT_PROJECT_LINK.to_string(),
            attribute: "href".to_string(),
        });
        self
    }

    /// Read the build status link; see [`build_id`]
    pub fn capture_build_id(self) -> Self {
        self.session.push(UiStep::CaptureAttribute {
            name: BUILD_LINK_CAPTURE.to_string(),
            selector: Self::BUILD_STATUS_LINK.to_string(),
            attribute: "href".to_string(),
        });
        self
    }
}

/// Steps shared by the "create from URL" pages
fn create_from_url(session: &mut UiSession, url: &str) {
    session.wait_for(SUBMIT_BUTTON, BASE_TIMEOUT_MS);
    session.fill("#url", url);
    session.click(SUBMIT_BUTTON);
    session.wait_for(".connectionSuccessful", BASE_TIMEOUT_MS);
}

fn verify_error(session: &mut UiSession, selector: &str, error: &str) {
    session.wait_for(selector, BASE_TIMEOUT_MS);
    session.expect_text(selector, error, BASE_TIMEOUT_MS);
}

fn create_url(project_id: &str, show_mode: &str) -> String {
    format!(
        "/admin/createObjectMenu.html?projectId={}&showMode={}",
        project_id, show_mode
    )
}

pub struct CreateProjectPage<'a> {
    session: &'a mut UiSession,
}

impl<'a> CreateProjectPage<'a> {
    pub fn open(session: &'a mut UiSession, parent_project_id: &str) -> Self {
        session.navigate(create_url(parent_project_id, "createProjectMenu"));
        Self { session }
    }

    pub fn create_from(self, url: &str) -> Self {
        create_from_url(self.session, url);
        self
    }

    pub fn setup_project(self, project_name: &str, build_type_name: &str) -> Self {
        self.session.fill("#projectName", project_name);
        self.session.fill("#buildTypeName", build_type_name);
        self.session.click(SUBMIT_BUTTON);
        self
    }

    pub fn verify_project_name_error(self, error: &str) -> Self {
        verify_error(self.session, "#error_projectName", error);
        self
    }

    /// After a successful setup the server lands on the build type editor
    pub fn into_edit_build_type(self) -> EditBuildTypePage<'a> {
        EditBuildTypePage::new(self.session)
    }
}

pub struct CreateBuildTypePage<'a> {
    session: &'a mut UiSession,
}

impl<'a> CreateBuildTypePage<'a> {
    pub fn open(session: &'a mut UiSession, project_id: &str) -> Self {
        session.navigate(create_url(project_id, "createBuildTypeMenu"));
        Self { session }
    }

    pub fn create_from(self, url: &str) -> Self {
        create_from_url(self.session, url);
        self
    }

    pub fn setup_build_type(self, build_type_name: &str) -> Self {
        self.session.fill("#buildTypeName", build_type_name);
        self.session.click(SUBMIT_BUTTON);
        self
    }

    pub fn verify_build_type_name_error(self, error: &str) -> Self {
        verify_error(self.session, "#error_buildTypeName", error);
        self
    }

    pub fn into_edit_build_type(self) -> EditBuildTypePage<'a> {
        EditBuildTypePage::new(self.session)
    }
}

pub struct CreateBuildTypeStepPage<'a> {
    session: &'a mut UiSession,
}

impl<'a> CreateBuildTypeStepPage<'a> {
    const COMMAND_LINE_RUNNER_TYPE: &'static str = "Command Line";

    pub fn open(session: &'a mut UiSession, build_type_id: &str) -> Self {
        session.navigate(format!(
            "/admin/editRunType.html?id=buildType:{}&runnerId=__NEW_RUNNER__",
            build_type_id
        ));
        Self { session }
    }

    pub fn create_command_line_build_step(self, custom_script: &str) -> EditBuildTypePage<'a> {
        self.session
            .wait_for(&by_data_test("runner-item-filter"), BASE_TIMEOUT_MS);
        self.session.push(UiStep::HoverAndClick {
            container: by_data_test("runner-item"),
            text: Self::COMMAND_LINE_RUNNER_TYPE.to_string(),
            target: by_data_test("ring-link"),
        });
        self.session.wait_for("#buildStepName", BASE_TIMEOUT_MS);
        self.session.fill("#buildStepName", &random_string());
        self.session.click(".CodeMirror-code");
        self.session.push(UiStep::Type {
            selector: ".CodeMirror textarea".to_string(),
            text: custom_script.to_string(),
        });
        self.session.click(SUBMIT_BUTTON);
        EditBuildTypePage::new(self.session)
    }
}

pub struct EditBuildTypePage<'a> {
    session: &'a mut UiSession,
}

impl<'a> EditBuildTypePage<'a> {
    const GENERAL_TAB: &'static str = "#general_Tab";
    // Present in every state of the editor, whatever the entry point
    const HEADER_HELP_ICON: &'static str = "h2 + div > span";

    fn new(session: &'a mut UiSession) -> Self {
        session.wait_for(Self::GENERAL_TAB, BASE_TIMEOUT_MS);
        session.wait_for(Self::HEADER_HELP_ICON, BASE_TIMEOUT_MS);
        Self { session }
    }

    /// Read the editor URL; see [`build_type_id`]
    pub fn capture_build_type_id(self) -> Self {
        self.session.push(UiStep::CaptureUrl {
            name: BUILD_TYPE_URL_CAPTURE.to_string(),
        });
        self
    }
}

fn first_group(pattern: &Lazy<Option<Regex>>, haystack: &str) -> Option<String> {
    pattern
        .as_ref()?
        .captures(haystack)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Project id from the captured edit-project link, recorded for cleanup
pub fn project_id(captures: &Captures, ledger: &SharedLedger) -> Option<String> {
    let id = captures
        .get(PROJECT_ID_CAPTURE)
        .and_then(|href| first_group(&PROJECT_ID, href));
    info!("projectId={}", id.as_deref().unwrap_or("null"));
    ledger.lock().record_created(EntityCategory::Projects, id.as_deref());
    id
}

/// Build type id from the captured editor URL, recorded for cleanup
pub fn build_type_id(captures: &Captures, ledger: &SharedLedger) -> Option<String> {
    let id = captures
        .get(BUILD_TYPE_URL_CAPTURE)
        .and_then(|url| first_group(&BUILD_TYPE_ID, url));
    info!("buildTypeId={}", id.as_deref().unwrap_or("null"));
    ledger
        .lock()
        .record_created(EntityCategory::BuildTypes, id.as_deref());
    id
}

/// Project owning a build type created through the UI, recorded for cleanup
pub fn owning_project(build_type: &BuildType, ledger: &SharedLedger) -> Option<Project> {
    let project = build_type.project.clone()?;
    info!("projectId={}", project.id.as_deref().unwrap_or("null"));
    ledger
        .lock()
        .record_created(EntityCategory::Projects, project.id.as_deref());
    Some(project)
}

/// Build id: the last path segment of the captured build status link
pub fn build_id(captures: &Captures) -> Option<String> {
    let id = captures
        .get(BUILD_LINK_CAPTURE)
        .map(|href| href.rsplit('/').next().unwrap_or(href).to_string());
    info!("buildId={}", id.as_deref().unwrap_or("null"));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playwright::PlaywrightConfig;
    use buildprobe_common::CreationLedger;
    use test_case::test_case;

    fn session() -> UiSession {
        UiSession::new(PlaywrightHandle::unchecked(PlaywrightConfig::default())).unwrap()
    }

    fn captured(name: &str, value: Option<&str>) -> Captures {
        let mut captures = Captures::default();
        captures.insert(name, value.map(str::to_string));
        captures
    }

    #[test_case("/admin/editProject.html?projectId=test_abc", Some("test_abc"))]
    #[test_case("/admin/editProject.html?projectId=test_abc&tab=general", Some("test_abc"))]
    #[test_case("/admin/editProject.html", None)]
    fn test_project_id_from_link(href: &str, expected: Option<&str>) {
        let ledger = CreationLedger::shared();
        let id = project_id(&captured(PROJECT_ID_CAPTURE, Some(href)), &ledger);
        assert_eq!(id.as_deref(), expected);
        assert_eq!(ledger.lock().len(), usize::from(expected.is_some()));
    }

    #[test]
    fn test_build_type_id_is_recorded() {
        let ledger = CreationLedger::shared();
        let url = "http://localhost:8111/admin/editBuild.html?id=buildType:test_bt&init=1";
        let id = build_type_id(&captured(BUILD_TYPE_URL_CAPTURE, Some(url)), &ledger);

        assert_eq!(id.as_deref(), Some("test_bt"));
        let ids: Vec<_> = ledger.lock().ids(EntityCategory::BuildTypes).map(String::from).collect();
        assert_eq!(ids, vec!["test_bt".to_string()]);
    }

    #[test]
    fn test_missing_link_records_nothing() {
        let ledger = CreationLedger::shared();
        assert_eq!(project_id(&captured(PROJECT_ID_CAPTURE, None), &ledger), None);
        assert_eq!(build_type_id(&Captures::default(), &ledger), None);
        assert!(ledger.lock().is_empty());
    }

    #[test]
    fn test_owning_project_is_recorded() {
        let ledger = CreationLedger::shared();
        let build_type = BuildType {
            id: Some("Demo_Build".to_string()),
            project: Some(Project {
                id: Some("Demo".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let project = owning_project(&build_type, &ledger).unwrap();
        assert_eq!(project.id_str(), "Demo");
        assert_eq!(
            ledger.lock().pending(),
            vec![(EntityCategory::Projects, "Demo".to_string())]
        );
        assert_eq!(owning_project(&BuildType::default(), &ledger), None);
        assert_eq!(ledger.lock().len(), 1);
    }

    #[test]
    fn test_build_id_is_last_path_segment() {
        let captures = captured(BUILD_LINK_CAPTURE, Some("/buildConfiguration/test_bt/1234"));
        assert_eq!(build_id(&captures).as_deref(), Some("1234"));
        assert_eq!(build_id(&Captures::default()), None);
    }

    #[test]
    fn test_login_queues_credentials_and_waits_for_projects() {
        let mut session = session();
        let user = User {
            username: Some("alice".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        LoginPage::open(&mut session).login(&user);

        let steps = session.pending();
        assert_eq!(steps[0], UiStep::Navigate { path: "/login.html".to_string() });
        assert!(steps.contains(&UiStep::Fill {
            selector: "#password".to_string(),
            value: "secret".to_string(),
        }));
        assert!(matches!(
            steps.last(),
            Some(UiStep::WaitFor { selector, .. }) if selector == ".MainPanel__router--gF > div"
        ));
    }

    #[test]
    fn test_create_project_flow_ends_on_build_type_editor() {
        let mut session = session();
        CreateProjectPage::open(&mut session, "_Root")
            .create_from("https://example.com/repo.git")
            .setup_project("test_project", "test_build")
            .into_edit_build_type()
            .capture_build_type_id();

        let steps = session.pending();
        assert_eq!(
            steps[0],
            UiStep::Navigate {
                path: "/admin/createObjectMenu.html?projectId=_Root&showMode=createProjectMenu".to_string()
            }
        );
        assert!(steps.contains(&UiStep::Fill {
            selector: "#projectName".to_string(),
            value: "test_project".to_string(),
        }));
        assert!(matches!(steps.last(), Some(UiStep::CaptureUrl { name }) if name == BUILD_TYPE_URL_CAPTURE));
    }

    #[test]
    fn test_selector_helpers() {
        assert_eq!(by_data_test("run-build"), "[data-test~='run-build']");
        assert_eq!(by_data_test_itemtype("project"), "[data-test-itemtype='project']");
    }
}
