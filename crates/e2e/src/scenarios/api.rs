//! REST API scenarios for projects, build types and search

use anyhow::{bail, Context};
use tracing::info;

use buildprobe_api::ResponseExpectation;
use buildprobe_common::model::{BuildType, Role, Roles};
use buildprobe_common::random::random_string_of_len;
use buildprobe_common::{assert_models_match, generate, EntityCategory, UserRole, Value};

use crate::context::TestContext;
use crate::runner::Scenario;

/// Longest id the server accepts for projects and build configurations
const ID_CHARACTERS_LIMIT: usize = 225;

/// Entities of each kind created by the search scenario
const CREATED_MODELS_COUNT: usize = 3;

scenario!(UserCreatesProject {
    name: "user_creates_project",
    description: "User should be able to create project",
    tags: ["api", "regression", "project"],
} => user_creates_project);

scenario!(UserCreatesTwoProjectsWithSameId {
    name: "user_creates_two_projects_with_same_id",
    description: "User should not be able to create two projects with the same id",
    tags: ["api", "regression", "project"],
} => user_creates_two_projects_with_same_id);

scenario!(UserCreatesProjectWithIdExceedingLimit {
    name: "user_creates_project_with_id_exceeding_limit",
    description: "User should not be able to create project with id exceeding the limit",
    tags: ["api", "regression", "project"],
} => user_creates_project_with_id_exceeding_limit);

scenario!(UnauthorizedUserCreatesProject {
    name: "unauthorized_user_creates_project",
    description: "Unauthorized user should not be able to create project",
    tags: ["api", "regression", "project"],
} => unauthorized_user_creates_project);

scenario!(UserDeletesProject {
    name: "user_deletes_project",
    description: "User should be able to delete project",
    tags: ["api", "regression", "project"],
} => user_deletes_project);

scenario!(UserCreatesBuildType {
    name: "user_creates_build_type",
    description: "User should be able to create build type",
    tags: ["api", "regression", "build_type"],
} => user_creates_build_type);

scenario!(UserCreatesTwoBuildTypesWithSameId {
    name: "user_creates_two_build_types_with_same_id",
    description: "User should not be able to create two build types with the same id",
    tags: ["api", "regression", "build_type"],
} => user_creates_two_build_types_with_same_id);

scenario!(UserCreatesBuildTypeWithIdExceedingLimit {
    name: "user_creates_build_type_with_id_exceeding_limit",
    description: "User should not be able to create build type with id exceeding the limit",
    tags: ["api", "regression", "build_type"],
} => user_creates_build_type_with_id_exceeding_limit);

scenario!(UnauthorizedUserCreatesBuildType {
    name: "unauthorized_user_creates_build_type",
    description: "Unauthorized user should not be able to create build type",
    tags: ["api", "regression", "build_type"],
} => unauthorized_user_creates_build_type);

scenario!(UserDeletesBuildType {
    name: "user_deletes_build_type",
    description: "User should be able to delete build type",
    tags: ["api", "regression", "build_type"],
} => user_deletes_build_type);

scenario!(ProjectAdminCreatesBuildType {
    name: "project_admin_creates_build_type",
    description: "Project admin should be able to create build type for their project",
    tags: ["api", "regression", "build_type", "roles"],
} => project_admin_creates_build_type);

scenario!(ProjectAdminCreatesBuildTypeForAnotherUserProject {
    name: "project_admin_creates_build_type_for_another_user_project",
    description: "Project admin should not be able to create build type for not their project",
    tags: ["api", "regression", "build_type", "roles"],
} => project_admin_creates_build_type_for_another_user_project);

scenario!(SearchModels {
    name: "search_models",
    description: "User should be able to search models",
    tags: ["api", "regression", "search"],
} => search_models);

pub fn scenarios() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(UserCreatesProject),
        Box::new(UserCreatesTwoProjectsWithSameId),
        Box::new(UserCreatesProjectWithIdExceedingLimit),
        Box::new(UnauthorizedUserCreatesProject),
        Box::new(UserDeletesProject),
        Box::new(UserCreatesBuildType),
        Box::new(UserCreatesTwoBuildTypesWithSameId),
        Box::new(UserCreatesBuildTypeWithIdExceedingLimit),
        Box::new(UnauthorizedUserCreatesBuildType),
        Box::new(UserDeletesBuildType),
        Box::new(ProjectAdminCreatesBuildType),
        Box::new(ProjectAdminCreatesBuildTypeForAnotherUserProject),
        Box::new(SearchModels),
    ]
}

/// Roles granting project admin on a single project
fn project_admin_of(project_id: &str) -> anyhow::Result<Roles> {
    Ok(generate::<Roles>(&[
        Value::Role(UserRole::ProjectAdmin),
        Value::Text(Role::project_scope(project_id)),
    ])?)
}

async fn user_creates_project(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;

    let project = ctx
        .checked_as(&data.user)?
        .projects()
        .create(&data.new_project_description)
        .await?;
    assert_models_match(&data.new_project_description, &project)?;
    Ok(())
}

async fn user_creates_two_projects_with_same_id(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;
    ctx.checked_as(&data.user)?
        .projects()
        .create(&data.new_project_description)
        .await?;

    let mut second = ctx.generate_more()?;
    second.new_project_description.id = data.new_project_description.id.clone();
    ctx.unchecked_as(&data.user)?
        .get(EntityCategory::Projects)
        .create(&second.new_project_description)
        .await?
        .expect(&ResponseExpectation::bad_request())?;
    Ok(())
}

async fn user_creates_project_with_id_exceeding_limit(ctx: &mut TestContext) -> anyhow::Result<()> {
    ctx.super_user().users().create(&ctx.test_data.user).await?;
    let user = ctx.test_data.user.clone();

    ctx.test_data.new_project_description.id = Some(random_string_of_len(ID_CHARACTERS_LIMIT + 1));
    ctx.unchecked_as(&user)?
        .get(EntityCategory::Projects)
        .create(&ctx.test_data.new_project_description)
        .await?
        .expect(&ResponseExpectation::internal_server_error())?;

    ctx.test_data.new_project_description.id = Some(random_string_of_len(ID_CHARACTERS_LIMIT));
    ctx.checked_as(&user)?
        .projects()
        .create(&ctx.test_data.new_project_description)
        .await?;
    Ok(())
}

async fn unauthorized_user_creates_project(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.unauth()?
        .get(EntityCategory::Projects)
        .create(&data.new_project_description)
        .await?
        .expect(&ResponseExpectation::unauthorized())?;

    ctx.super_user_unchecked()
        .get(EntityCategory::Projects)
        .read(data.project.id_str())
        .await?
        .expect(&ResponseExpectation::not_found_with_entity_not_found())?;
    Ok(())
}

async fn user_deletes_project(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;

    let projects = ctx.checked_as(&data.user)?.projects();
    projects.create(&data.new_project_description).await?;
    projects.delete(data.project.id_str()).await?;

    ctx.unchecked_as(&data.user)?
        .get(EntityCategory::Projects)
        .read(data.project.id_str())
        .await?
        .expect(&ResponseExpectation::not_found_with_entity_not_found())?;
    Ok(())
}

async fn user_creates_build_type(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;
    ctx.super_user().projects().create(&data.new_project_description).await?;

    let build_type = ctx
        .checked_as(&data.user)?
        .build_types()
        .create(&data.build_type)
        .await?;
    assert_models_match(&data.build_type, &build_type)?;
    Ok(())
}

async fn user_creates_two_build_types_with_same_id(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;
    ctx.super_user().projects().create(&data.new_project_description).await?;
    ctx.checked_as(&data.user)?
        .build_types()
        .create(&data.build_type)
        .await?;

    let mut second = ctx.generate_more()?;
    second.build_type.id = data.build_type.id.clone();
    second.build_type.project = data.build_type.project.clone();
    ctx.unchecked_as(&data.user)?
        .get(EntityCategory::BuildTypes)
        .create(&second.build_type)
        .await?
        .expect(&ResponseExpectation::bad_request_with_duplicate_id())?;
    Ok(())
}

async fn user_creates_build_type_with_id_exceeding_limit(ctx: &mut TestContext) -> anyhow::Result<()> {
    ctx.super_user().users().create(&ctx.test_data.user).await?;
    ctx.super_user()
        .projects()
        .create(&ctx.test_data.new_project_description)
        .await?;
    let user = ctx.test_data.user.clone();

    ctx.test_data.build_type.id = Some(random_string_of_len(ID_CHARACTERS_LIMIT + 1));
    ctx.unchecked_as(&user)?
        .get(EntityCategory::BuildTypes)
        .create(&ctx.test_data.build_type)
        .await?
        .expect(&ResponseExpectation::internal_server_error())?;

    ctx.test_data.build_type.id = Some(random_string_of_len(ID_CHARACTERS_LIMIT));
    ctx.checked_as(&user)?
        .build_types()
        .create(&ctx.test_data.build_type)
        .await?;
    Ok(())
}

async fn unauthorized_user_creates_build_type(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().projects().create(&data.new_project_description).await?;

    ctx.unauth()?
        .get(EntityCategory::BuildTypes)
        .create(&data.build_type)
        .await?
        .expect(&ResponseExpectation::unauthorized())?;

    ctx.super_user_unchecked()
        .get(EntityCategory::BuildTypes)
        .read(data.build_type.id_str())
        .await?
        .expect(&ResponseExpectation::not_found_with_entity_not_found())?;
    Ok(())
}

async fn user_deletes_build_type(ctx: &mut TestContext) -> anyhow::Result<()> {
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;
    ctx.super_user().projects().create(&data.new_project_description).await?;

    let build_types = ctx.checked_as(&data.user)?.build_types();
    build_types.create(&data.build_type).await?;
    build_types.delete(data.build_type.id_str()).await?;

    ctx.unchecked_as(&data.user)?
        .get(EntityCategory::BuildTypes)
        .read(data.build_type.id_str())
        .await?
        .expect(&ResponseExpectation::not_found_with_entity_not_found())?;
    Ok(())
}

async fn project_admin_creates_build_type(ctx: &mut TestContext) -> anyhow::Result<()> {
    ctx.super_user()
        .projects()
        .create(&ctx.test_data.new_project_description)
        .await?;

    ctx.test_data.user.roles = Some(project_admin_of(ctx.test_data.project.id_str())?);
    let data = &ctx.test_data;
    ctx.super_user().users().create(&data.user).await?;

    let build_type = ctx
        .checked_as(&data.user)?
        .build_types()
        .create(&data.build_type)
        .await?;
    assert_models_match(&data.build_type, &build_type)?;
    Ok(())
}

async fn project_admin_creates_build_type_for_another_user_project(
    ctx: &mut TestContext,
) -> anyhow::Result<()> {
    let mut second = ctx.generate_more()?;
    ctx.super_user()
        .projects()
        .create(&ctx.test_data.new_project_description)
        .await?;
    ctx.super_user()
        .projects()
        .create(&second.new_project_description)
        .await?;

    ctx.test_data.user.roles = Some(project_admin_of(ctx.test_data.project.id_str())?);
    second.user.roles = Some(project_admin_of(second.project.id_str())?);
    ctx.super_user().users().create(&ctx.test_data.user).await?;
    ctx.super_user().users().create(&second.user).await?;

    ctx.unchecked_as(&ctx.test_data.user)?
        .get(EntityCategory::BuildTypes)
        .create(&second.build_type)
        .await?
        .expect(&ResponseExpectation::forbidden_with_access_denied())?;
    Ok(())
}

async fn search_models(ctx: &mut TestContext) -> anyhow::Result<()> {
    let mut created_projects = Vec::new();
    let mut created_users = Vec::new();
    let mut created_build_types = Vec::new();

    for _ in 0..CREATED_MODELS_COUNT {
        let super_user = ctx.super_user();
        let data = &ctx.test_data;
        created_projects.push(super_user.projects().create(&data.new_project_description).await?);
        created_users.push(super_user.users().create(&data.user).await?);
        created_build_types.push(super_user.build_types().create(&data.build_type).await?);
        ctx.regenerate()?;
    }

    let projects = ctx.super_user().projects().search().await?;
    let users = ctx.super_user().users().search().await?;
    let build_types = ctx.super_user().build_types().search().await?;
    info!(
        "Search returned {} project(s), {} user(s), {} build type(s)",
        projects.len(),
        users.len(),
        build_types.len()
    );

    for created in &created_projects {
        let found = projects
            .iter()
            .find(|p| p.id == created.id)
            .with_context(|| format!("project {} not found by search", created.id_str()))?;
        assert_models_match(created, found)?;
    }
    for created in &created_users {
        let Some(found) = users.iter().find(|u| u.id == created.id) else {
            bail!("user {} not found by search", created.username_str());
        };
        assert_models_match(created, found)?;
    }
    for created in &created_build_types {
        let found = build_types
            .iter()
            .find(|bt| bt.id == created.id)
            .with_context(|| format!("build type {} not found by search", created.id_str()))?;
        // List items carry a flat projectId instead of the nested project
        let expected = match found.project {
            Some(_) => created.clone(),
            None => BuildType {
                project: None,
                ..created.clone()
            },
        };
        assert_models_match(&expected, found)?;
    }
    Ok(())
}
