use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{Project, ShapeKind};
use crate::shape::{field, Directive, FieldSpec, Shape};

/// A build configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Steps>,
}

impl BuildType {
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl Shape for BuildType {
    const KIND: ShapeKind = ShapeKind::BuildType;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<BuildType>>> = Lazy::new(|| {
            vec![
                field!(BuildType, "id" => id, Directive::Random),
                field!(BuildType, "name" => name, Directive::Random),
                field!(BuildType, "project" => project),
                field!(BuildType, "steps" => steps, Directive::Skip),
            ]
        });
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Steps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Vec<Step>>,
}

impl Shape for Steps {
    const KIND: ShapeKind = ShapeKind::Steps;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Steps>>> = Lazy::new(|| vec![field!(Steps, "step" => step)]);
        &FIELDS
    }
}

/// A build step; runner settings travel in `properties`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl Step {
    pub const SIMPLE_RUNNER: &'static str = "simpleRunner";
}

impl Default for Step {
    fn default() -> Self {
        Self {
            name: None,
            step_type: Some(Self::SIMPLE_RUNNER.to_string()),
            properties: None,
        }
    }
}

impl Shape for Step {
    const KIND: ShapeKind = ShapeKind::Step;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Step>>> = Lazy::new(|| {
            vec![
                field!(Step, "name" => name, Directive::Random),
                field!(Step, "type" => step_type),
                field!(Step, "properties" => properties),
            ]
        });
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<Vec<Property>>,
}

impl Shape for Properties {
    const KIND: ShapeKind = ShapeKind::Properties;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Properties>>> =
            Lazy::new(|| vec![field!(Properties, "property" => property, Directive::FromParameters)]);
        &FIELDS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }
}

impl Shape for Property {
    const KIND: ShapeKind = ShapeKind::Property;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Property>>> = Lazy::new(|| {
            vec![
                field!(Property, "name" => name, Directive::FromParameters),
                field!(Property, "value" => value, Directive::FromParameters),
            ]
        });
        &FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_uses_wire_name() {
        let step = Step {
            name: Some("compile".to_string()),
            properties: Some(Properties {
                property: Some(vec![Property::new("script.content", "echo hi")]),
            }),
            ..Default::default()
        };

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "simpleRunner");
        assert_eq!(json["properties"]["property"][0]["name"], "script.content");
    }

    #[test]
    fn test_build_type_response_parses_nested_project() {
        let build_type: BuildType = serde_json::from_str(
            r#"{"id": "bt1", "name": "Build", "projectId": "p1", "project": {"id": "p1", "name": "Demo"}}"#,
        )
        .unwrap();
        assert_eq!(build_type.id_str(), "bt1");
        assert_eq!(build_type.project.unwrap().id_str(), "p1");
        assert_eq!(build_type.steps, None);
    }
}
