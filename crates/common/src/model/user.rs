use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::ShapeKind;
use crate::shape::{field, Directive, FieldSpec, Shape};
use crate::types::UserRole;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(with = "super::id_format", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Roles>,
}

impl User {
    pub fn username_str(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub fn password_str(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

impl Shape for User {
    const KIND: ShapeKind = ShapeKind::User;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<User>>> = Lazy::new(|| {
            vec![
                field!(User, "id" => id),
                field!(User, "username" => username, Directive::Random),
                field!(User, "password" => password, Directive::Random),
                field!(User, "email" => email, Directive::Skip),
                field!(User, "roles" => roles),
            ]
        });
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Vec<Role>>,
}

impl Shape for Roles {
    const KIND: ShapeKind = ShapeKind::Roles;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Roles>>> = Lazy::new(|| vec![field!(Roles, "role" => role)]);
        &FIELDS
    }
}

/// A role assignment; `scope` is `g` for global or `p:<projectId>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Role {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Role {
    pub const GLOBAL_SCOPE: &'static str = "g";

    /// Scope string for a role limited to one project
    pub fn project_scope(project_id: &str) -> String {
        format!("p:{}", project_id)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self {
            role_id: Some(UserRole::SystemAdmin),
            scope: Some(Self::GLOBAL_SCOPE.to_string()),
        }
    }
}

impl Shape for Role {
    const KIND: ShapeKind = ShapeKind::Role;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Role>>> = Lazy::new(|| {
            vec![
                field!(Role, "roleId" => role_id, Directive::FromParameters),
                field!(Role, "scope" => scope, Directive::FromParameters),
            ]
        });
        &FIELDS
    }
}
