//! Field-mapped comparison of a request body with the server's response
//!
//! Rules map a request shape to the response shape it produces, plus the
//! fields that must carry the same value across the round trip. Paths are
//! dotted (`project.id`) and resolved against the JSON form of each side.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::error::{Error, Mismatch, Result};
use crate::model::ShapeKind;
use crate::shape::{FieldKind, Shape};

const DEFAULT_RULES: &str = include_str!("../model-comparison.toml");

/// One `request path -> response path` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub request: String,
    pub response: String,
}

impl FieldMapping {
    /// Parse `"a"` or `"a=b"`
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((request, response)) => Self {
                request: request.trim().to_string(),
                response: response.trim().to_string(),
            },
            None => Self {
                request: spec.trim().to_string(),
                response: spec.trim().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRule {
    pub response: String,
    pub fields: Vec<FieldMapping>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    response: String,
    #[serde(default)]
    fields: Vec<String>,
}

/// Comparison rules keyed by request shape name
#[derive(Debug, Clone, Default)]
pub struct ComparisonRules {
    rules: HashMap<String, ComparisonRule>,
}

impl ComparisonRules {
    pub fn parse(content: &str) -> Result<Self> {
        let raw: HashMap<String, RawRule> = toml::from_str(content)?;
        let rules = raw
            .into_iter()
            .map(|(request, rule)| {
                let fields = rule.fields.iter().map(|f| FieldMapping::parse(f)).collect();
                (
                    request,
                    ComparisonRule {
                        response: rule.response,
                        fields,
                    },
                )
            })
            .collect();
        Ok(Self { rules })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The rule set shipped with the crate
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_RULES)
    }

    pub fn rule_for(&self, request_shape: &str) -> Result<&ComparisonRule> {
        self.rules
            .get(request_shape)
            .ok_or_else(|| Error::MissingComparisonRule(request_shape.to_string()))
    }

    /// Check that `response` carries the mapped fields of `request`
    pub fn assert_match<A, B>(&self, request: &A, response: &B) -> Result<()>
    where
        A: Shape + Serialize,
        B: Shape + Serialize,
    {
        let rule = self.rule_for(A::KIND.name())?;
        if rule.response != B::KIND.name() {
            return Err(Error::MissingComparisonRule(format!(
                "{} -> {}",
                A::KIND.name(),
                B::KIND.name()
            )));
        }

        for mapping in &rule.fields {
            check_path(A::KIND, &mapping.request)?;
            check_path(B::KIND, &mapping.response)?;
        }

        let mismatches = compare_fields(request, response, &rule.fields)?;
        if mismatches.is_empty() {
            debug!(
                "{} matches {} on {} field(s)",
                A::KIND.name(),
                B::KIND.name(),
                rule.fields.len()
            );
            Ok(())
        } else {
            Err(Error::Comparison(mismatches))
        }
    }
}

/// Compare using the embedded rule set
pub fn assert_models_match<A, B>(request: &A, response: &B) -> Result<()>
where
    A: Shape + Serialize,
    B: Shape + Serialize,
{
    ComparisonRules::embedded()?.assert_match(request, response)
}

/// Compare mapped paths by their string rendering; absent values render as `null`
pub fn compare_fields<A: Serialize, B: Serialize>(
    request: &A,
    response: &B,
    mappings: &[FieldMapping],
) -> Result<Vec<Mismatch>> {
    let request = serde_json::to_value(request)?;
    let response = serde_json::to_value(response)?;

    Ok(mappings
        .iter()
        .filter_map(|mapping| {
            let expected = render(lookup(&request, &mapping.request));
            let actual = render(lookup(&response, &mapping.response));
            (expected != actual).then(|| Mismatch {
                field: format!("{} -> {}", mapping.request, mapping.response),
                expected,
                actual,
            })
        })
        .collect())
}

fn lookup<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    path.split('.').try_fold(root, |node, segment| match node {
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => node.get(segment),
    })
}

fn render(value: Option<&Json>) -> String {
    match value {
        None | Some(Json::Null) => "null".to_string(),
        Some(Json::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Reject paths naming fields the shape does not declare
fn check_path(kind: ShapeKind, path: &str) -> Result<()> {
    let mut current = Some(kind);
    let mut in_list = false;
    for segment in path.split('.') {
        if in_list && segment.parse::<usize>().is_ok() {
            in_list = false;
            continue;
        }
        let Some(shape) = current else {
            return Err(Error::MissingModelField {
                model: kind.name().to_string(),
                field: path.to_string(),
            });
        };
        let field = shape
            .fields()
            .into_iter()
            .find(|f| f.name == segment)
            .ok_or_else(|| Error::MissingModelField {
                model: shape.name().to_string(),
                field: segment.to_string(),
            })?;
        (current, in_list) = match field.kind {
            FieldKind::Nested(nested) => (Some(nested), false),
            FieldKind::List(element) => (Some(element), true),
            _ => (None, false),
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Build, BuildType, NewProjectDescription, Project, Role, User};
    use std::io::Write;

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            locator: None,
        }
    }

    fn description(id: &str, name: &str) -> NewProjectDescription {
        NewProjectDescription {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_field_mapping_syntax() {
        assert_eq!(
            FieldMapping::parse("locator = id"),
            FieldMapping {
                request: "locator".to_string(),
                response: "id".to_string(),
            }
        );
        assert_eq!(FieldMapping::parse("name").response, "name");
    }

    #[test]
    fn test_embedded_rules_accept_matching_models() {
        assert_models_match(&description("p1", "Demo"), &project("p1", "Demo")).unwrap();
    }

    #[test]
    fn test_mismatches_are_reported_by_mapped_path() {
        let err = assert_models_match(&description("p1", "Demo"), &project("p1", "Other")).unwrap_err();
        match err {
            Error::Comparison(mismatches) => {
                assert_eq!(
                    mismatches,
                    vec![Mismatch {
                        field: "name -> name".to_string(),
                        expected: "Demo".to_string(),
                        actual: "Other".to_string(),
                    }]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_paths_and_absent_values() {
        let request = BuildType {
            id: Some("bt1".to_string()),
            name: Some("Build".to_string()),
            project: Some(project("p1", "Demo")),
            steps: None,
        };
        let response = BuildType {
            project: None,
            ..request.clone()
        };

        let err = assert_models_match(&request, &response).unwrap_err();
        assert!(err.to_string().contains("- project.id -> project.id: expected=p1, actual=null"));
    }

    #[test]
    fn test_missing_rule_is_an_error() {
        let err = assert_models_match(&Role::default(), &Role::default()).unwrap_err();
        assert!(matches!(err, Error::MissingComparisonRule(name) if name == "Role"));

        let err = assert_models_match(&User::default(), &project("p1", "Demo")).unwrap_err();
        assert!(matches!(err, Error::MissingComparisonRule(name) if name == "User -> Project"));
    }

    #[test]
    fn test_finished_build_matches_on_state_and_status() {
        let expected = Build {
            state: Some("finished".to_string()),
            status: Some("SUCCESS".to_string()),
            ..Default::default()
        };
        let actual = Build {
            id: Some("42".to_string()),
            ..expected.clone()
        };
        assert_models_match(&expected, &actual).unwrap();
        assert_models_match(&project("p1", "Demo"), &project("Demo", "Demo")).unwrap();
    }

    #[test]
    fn test_rules_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[NewProjectDescription]\nresponse = \"Project\"\nfields = [\"parentProject.locator=id\"]"
        )
        .unwrap();

        let rules = ComparisonRules::load(file.path()).unwrap();
        let request = description("ignored", "ignored");
        rules.assert_match(&request, &project("_Root", "x")).unwrap();
    }

    #[test]
    fn test_undeclared_fields_are_rejected() {
        let rules = ComparisonRules::parse(
            "[NewProjectDescription]\nresponse = \"Project\"\nfields = [\"name=title\"]",
        )
        .unwrap();

        let err = rules
            .assert_match(&description("p1", "Demo"), &project("p1", "Demo"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingModelField { model, field } if model == "Project" && field == "title"));
    }

    #[test]
    fn test_list_paths_index_elements() {
        let json = serde_json::json!({"roles": {"role": [{"scope": "g"}]}});
        assert_eq!(render(lookup(&json, "roles.role.0.scope")), "g");
        check_path(ShapeKind::User, "roles.role.0.scope").unwrap();
        assert!(check_path(ShapeKind::User, "roles.role.0.missing").is_err());
    }
}
