//! Core enumerations shared by the generator, the ledger and the request layer

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ShapeKind;

/// Resource kinds exposed by the server's REST API.
///
/// Declaration order is the deletion priority: entities that depend on
/// others come first, so a queued build is removed before its build
/// configuration and a build configuration before its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityCategory {
    BuildQueue,
    Builds,
    BuildTypes,
    Users,
    Projects,
}

impl EntityCategory {
    /// Every category in deletion-priority order
    pub const ALL: [EntityCategory; 5] = [
        EntityCategory::BuildQueue,
        EntityCategory::Builds,
        EntityCategory::BuildTypes,
        EntityCategory::Users,
        EntityCategory::Projects,
    ];

    /// REST resource path, relative to the server root
    pub fn path(self) -> &'static str {
        match self {
            EntityCategory::BuildQueue => "/app/rest/buildQueue",
            EntityCategory::Builds => "/app/rest/builds",
            EntityCategory::BuildTypes => "/app/rest/buildTypes",
            EntityCategory::Users => "/app/rest/users",
            EntityCategory::Projects => "/app/rest/projects",
        }
    }

    /// Entity shape carried by requests and responses of this category
    pub fn shape(self) -> ShapeKind {
        match self {
            EntityCategory::BuildQueue | EntityCategory::Builds => ShapeKind::Build,
            EntityCategory::BuildTypes => ShapeKind::BuildType,
            EntityCategory::Users => ShapeKind::User,
            EntityCategory::Projects => ShapeKind::Project,
        }
    }

    /// Key of the entity list in a search response (`{"project": [...]}`)
    pub fn search_key(self) -> &'static str {
        match self {
            EntityCategory::BuildQueue | EntityCategory::Builds => "build",
            EntityCategory::BuildTypes => "buildType",
            EntityCategory::Users => "user",
            EntityCategory::Projects => "project",
        }
    }

    /// Position in the deletion-priority list
    pub fn priority(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityCategory::BuildQueue => "buildQueue",
            EntityCategory::Builds => "builds",
            EntityCategory::BuildTypes => "buildTypes",
            EntityCategory::Users => "users",
            EntityCategory::Projects => "projects",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role identifiers understood by the server's permission model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    SystemAdmin,
    ProjectAdmin,
    ProjectDeveloper,
    ProjectViewer,
    AgentManager,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::SystemAdmin => "SYSTEM_ADMIN",
            UserRole::ProjectAdmin => "PROJECT_ADMIN",
            UserRole::ProjectDeveloper => "PROJECT_DEVELOPER",
            UserRole::ProjectViewer => "PROJECT_VIEWER",
            UserRole::AgentManager => "AGENT_MANAGER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_matches_declaration_order() {
        for (index, category) in EntityCategory::ALL.iter().enumerate() {
            assert_eq!(category.priority(), index);
        }
        assert!(EntityCategory::BuildTypes < EntityCategory::Projects);
    }

    #[test]
    fn test_build_categories_share_shape() {
        assert_eq!(EntityCategory::BuildQueue.shape(), ShapeKind::Build);
        assert_eq!(EntityCategory::Builds.shape(), ShapeKind::Build);
        assert_eq!(EntityCategory::Projects.search_key(), "project");
    }

    #[test]
    fn test_user_role_wire_format() {
        let json = serde_json::to_string(&UserRole::ProjectAdmin).unwrap();
        assert_eq!(json, "\"PROJECT_ADMIN\"");
        assert_eq!(UserRole::ProjectAdmin.to_string(), "PROJECT_ADMIN");
    }
}
