use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::ShapeKind;
use crate::shape::{field, FieldSpec, Shape};

/// Server-wide authentication settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerAuthSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_project_permissions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<AuthModules>,
}

impl Shape for ServerAuthSettings {
    const KIND: ShapeKind = ShapeKind::ServerAuthSettings;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<ServerAuthSettings>>> = Lazy::new(|| {
            vec![
                field!(ServerAuthSettings, "perProjectPermissions" => per_project_permissions),
                field!(ServerAuthSettings, "modules" => modules),
            ]
        });
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthModules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<Vec<AuthModule>>,
}

impl Shape for AuthModules {
    const KIND: ShapeKind = ShapeKind::AuthModules;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<AuthModules>>> =
            Lazy::new(|| vec![field!(AuthModules, "module" => module)]);
        &FIELDS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthModule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AuthModule {
    pub const HTTP_BASIC: &'static str = "HTTP-Basic";
}

impl Default for AuthModule {
    fn default() -> Self {
        Self {
            name: Some(Self::HTTP_BASIC.to_string()),
        }
    }
}

impl Shape for AuthModule {
    const KIND: ShapeKind = ShapeKind::AuthModule;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<AuthModule>>> =
            Lazy::new(|| vec![field!(AuthModule, "name" => name)]);
        &FIELDS
    }
}
