//! Browser flows: create project, create build type, start build
//!
//! Every UI action is verified afterwards through the REST API as the
//! logged-in user.

use anyhow::Context;

use buildprobe_common::assert_models_match;
use buildprobe_common::model::{Build, BuildType, ROOT_PROJECT_LOCATOR};

use crate::context::TestContext;
use crate::pages::{
    self, CreateBuildTypePage, CreateBuildTypeStepPage, CreateProjectPage, ProjectsPage,
};
use crate::runner::Scenario;

/// Repository the "create from URL" flows import
const GIT_URL: &str = "https://github.com/selenide/selenide.git";

const HELLO_WORLD_SCRIPT: &str = "echo 'Hello World!'";

scenario!(UiUserCreatesProject {
    name: "ui_user_creates_project",
    description: "User should be able to create project",
    tags: ["ui", "regression", "project"],
} => user_creates_project);

scenario!(UiUserCreatesProjectWithoutName {
    name: "ui_user_creates_project_without_name",
    description: "User should not be able to create project without name",
    tags: ["ui", "regression", "project"],
} => user_creates_project_without_name);

scenario!(UiUserCreatesBuildType {
    name: "ui_user_creates_build_type",
    description: "User should be able to create build type",
    tags: ["ui", "regression", "build_type"],
    browsers: [Chromium, Firefox],
} => user_creates_build_type);

scenario!(UiUserCreatesBuildTypeWithoutName {
    name: "ui_user_creates_build_type_without_name",
    description: "User should not be able to create build type without name",
    tags: ["ui", "regression", "build_type"],
    browsers: [Chromium, Firefox],
} => user_creates_build_type_without_name);

scenario!(UiUserStartsBuild {
    name: "ui_user_creates_build_type_step_and_starts_build",
    description: "User should be able to create build type step and start build",
    tags: ["ui", "regression", "build"],
} => user_creates_build_type_step_and_starts_build);

pub fn scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(UiUserCreatesProject),
        Box::new(UiUserCreatesProjectWithoutName),
        Box::new(UiUserCreatesBuildType),
        Box::new(UiUserCreatesBuildTypeWithoutName),
        Box::new(UiUserStartsBuild),
    ]
}

fn parent_locator(ctx: &TestContext) -> &str {
    ctx.test_data
        .new_project_description
        .parent_project
        .as_ref()
        .and_then(|p| p.locator.as_deref())
        .unwrap_or(ROOT_PROJECT_LOCATOR)
}

async fn user_creates_project(ctx: &mut TestContext) -> anyhow::Result<()> {
    let mut session = ctx.ui_session()?;
    let data = &ctx.test_data;
    ctx.login_as(&mut session, &data.user).await?;

    CreateProjectPage::open(&mut session, parent_locator(ctx))
        .create_from(GIT_URL)
        .setup_project(data.project.name_str(), data.build_type.name_str())
        .into_edit_build_type()
        .capture_build_type_id();
    let captures = session.run().await?;
    let build_type_id = pages::build_type_id(&captures, ctx.ledger())
        .context("build type id missing from the editor URL")?;

    let user = ctx.checked_as(&data.user)?;
    let build_type = user.build_types().read(&build_type_id).await?;
    let created_project = pages::owning_project(&build_type, ctx.ledger())
        .context("created build type has no project")?;
    assert_models_match(&data.project, &created_project)?;

    // The server derives both ids from the names
    let expected = BuildType {
        id: Some(build_type_id),
        project: Some(created_project),
        ..data.build_type.clone()
    };
    assert_models_match(&expected, &build_type)?;

    ProjectsPage::open(&mut session)
        .verify_project_and_build_type(data.project.name_str(), data.build_type.name_str())
        .capture_project_id();
    let captures = session.run().await?;
    let project_id = pages::project_id(&captures, ctx.ledger())
        .context("project id missing from the edit project link")?;

    let project = user.projects().read(&project_id).await?;
    assert_models_match(&data.project, &project)?;
    Ok(())
}

async fn user_creates_project_without_name(ctx: &mut TestContext) -> anyhow::Result<()> {
    let mut session = ctx.ui_session()?;
    let data = &ctx.test_data;
    ctx.login_as(&mut session, &data.user).await?;

    CreateProjectPage::open(&mut session, parent_locator(ctx))
        .create_from(GIT_URL)
        .setup_project("", data.build_type.name_str())
        .verify_project_name_error("Project name must not be empty");
    session.run().await?;
    Ok(())
}

async fn user_creates_build_type(ctx: &mut TestContext) -> anyhow::Result<()> {
    let mut session = ctx.ui_session()?;
    let data = &ctx.test_data;
    ctx.login_as(&mut session, &data.user).await?;
    ctx.super_user().projects().create(&data.new_project_description).await?;

    CreateBuildTypePage::open(&mut session, data.project.id_str())
        .create_from(GIT_URL)
        .setup_build_type(data.build_type.name_str())
        .into_edit_build_type()
        .capture_build_type_id();
    let captures = session.run().await?;
    let build_type_id = pages::build_type_id(&captures, ctx.ledger())
        .context("build type id missing from the editor URL")?;

    let build_type = ctx
        .checked_as(&data.user)?
        .build_types()
        .read(&build_type_id)
        .await?;
    let expected = BuildType {
        id: Some(build_type_id),
        ..data.build_type.clone()
    };
    assert_models_match(&expected, &build_type)?;
    Ok(())
}

async fn user_creates_build_type_without_name(ctx: &mut TestContext) -> anyhow::Result<()> {
    let mut session = ctx.ui_session()?;
    let data = &ctx.test_data;
    ctx.login_as(&mut session, &data.user).await?;
    ctx.super_user().projects().create(&data.new_project_description).await?;

    CreateBuildTypePage::open(&mut session, data.project.id_str())
        .create_from(GIT_URL)
        .setup_build_type("")
        .verify_build_type_name_error("Build configuration name must not be empty");
    session.run().await?;
    Ok(())
}

async fn user_creates_build_type_step_and_starts_build(ctx: &mut TestContext) -> anyhow::Result<()> {
    let mut session = ctx.ui_session()?;
    let data = &ctx.test_data;
    ctx.login_as(&mut session, &data.user).await?;
    ctx.super_user().projects().create(&data.new_project_description).await?;
    ctx.super_user().build_types().create(&data.build_type).await?;

    CreateBuildTypeStepPage::open(&mut session, data.build_type.id_str())
        .create_command_line_build_step(HELLO_WORLD_SCRIPT);
    ProjectsPage::open(&mut session)
        .verify_project_and_build_type(data.project.name_str(), data.build_type.name_str())
        .run_build_and_wait_until_it_is_finished()
        .capture_build_id();
    let captures = session.run().await?;
    let build_id = pages::build_id(&captures).context("build id missing from the build status link")?;

    let build = ctx.checked_as(&data.user)?.builds().read(&build_id).await?;
    let expected = Build {
        state: Some("finished".to_string()),
        status: Some("SUCCESS".to_string()),
        ..Default::default()
    };
    assert_models_match(&expected, &build)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildprobe_api::ProbeConfig;

    #[test]
    fn test_projects_are_created_under_root() {
        let ctx = TestContext::begin(&ProbeConfig::default()).unwrap();
        assert_eq!(parent_locator(&ctx), "_Root");
    }
}
