use std::collections::HashSet;

use super::{BuildType, Entity, NewProjectDescription, Project, ShapeKind, User};
use crate::error::{Error, Result};

/// The full set of related entities generated for one test.
///
/// [`TestData::SLOTS`] lists the top-level shapes in generation order. A slot
/// may reuse or copy from any slot declared before it, never after.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestData {
    pub new_project_description: NewProjectDescription,
    pub project: Project,
    pub user: User,
    pub build_type: BuildType,
}

impl TestData {
    pub const SLOTS: &'static [(&'static str, ShapeKind)] = &[
        ("newProjectDescription", ShapeKind::NewProjectDescription),
        ("project", ShapeKind::Project),
        ("user", ShapeKind::User),
        ("buildType", ShapeKind::BuildType),
    ];

    /// Put a generated entity into the slot of its shape
    pub fn store(&mut self, entity: Entity) -> Result<()> {
        match entity {
            Entity::NewProjectDescription(inner) => self.new_project_description = inner,
            Entity::Project(inner) => self.project = inner,
            Entity::User(inner) => self.user = inner,
            Entity::BuildType(inner) => self.build_type = inner,
            other => {
                return Err(Error::Schema(format!(
                    "TestData has no slot for {}",
                    other.kind().name()
                )))
            }
        }
        Ok(())
    }

    /// Reject slot tables that declare the same shape twice
    pub fn validate_schema() -> Result<()> {
        Self::validate_slots(Self::SLOTS)
    }

    pub(crate) fn validate_slots(slots: &[(&str, ShapeKind)]) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, kind) in slots {
            if !seen.insert(*kind) {
                return Err(Error::Schema(format!(
                    "TestData slot '{}' repeats shape {}",
                    name,
                    kind.name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Build;

    #[test]
    fn test_declared_slots_are_valid() {
        TestData::validate_schema().unwrap();
    }

    #[test]
    fn test_duplicate_slot_shapes_are_rejected() {
        let slots = [("first", ShapeKind::Project), ("second", ShapeKind::Project)];
        let err = TestData::validate_slots(&slots).unwrap_err();
        assert!(err.to_string().contains("'second' repeats shape Project"));
    }

    #[test]
    fn test_store_rejects_shapes_without_a_slot() {
        let mut data = TestData::default();
        data.store(
            Project {
                id: Some("p1".to_string()),
                ..Default::default()
            }
            .into(),
        )
        .unwrap();
        assert_eq!(data.project.id_str(), "p1");

        assert!(data.store(Build::default().into()).is_err());
    }
}
