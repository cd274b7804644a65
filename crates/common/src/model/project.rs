use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{ShapeKind, ROOT_PROJECT_LOCATOR};
use crate::shape::{field, Directive, FieldSpec, Shape};

/// Request body for creating a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewProjectDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_project: Option<Project>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_all_associated_settings: Option<bool>,
}

impl Default for NewProjectDescription {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            parent_project: Some(Project::locator(ROOT_PROJECT_LOCATOR)),
            copy_all_associated_settings: Some(true),
        }
    }
}

impl Shape for NewProjectDescription {
    const KIND: ShapeKind = ShapeKind::NewProjectDescription;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<NewProjectDescription>>> = Lazy::new(|| {
            vec![
                field!(NewProjectDescription, "id" => id, Directive::Random),
                field!(NewProjectDescription, "name" => name, Directive::Random),
                field!(NewProjectDescription, "parentProject" => parent_project, Directive::Skip),
                field!(
                    NewProjectDescription,
                    "copyAllAssociatedSettings" => copy_all_associated_settings,
                    Directive::Skip
                ),
            ]
        });
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

impl Project {
    /// A reference to an existing project by locator only
    pub fn locator(locator: impl Into<String>) -> Self {
        Self {
            locator: Some(locator.into()),
            ..Default::default()
        }
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl Shape for Project {
    const KIND: ShapeKind = ShapeKind::Project;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Project>>> = Lazy::new(|| {
            vec![
                field!(
                    Project,
                    "id" => id,
                    Directive::CopyFrom(ShapeKind::NewProjectDescription),
                    Directive::Random
                ),
                field!(
                    Project,
                    "name" => name,
                    Directive::CopyFrom(ShapeKind::NewProjectDescription),
                    Directive::Random
                ),
                field!(Project, "locator" => locator),
            ]
        });
        &FIELDS
    }
}
