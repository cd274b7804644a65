//! Registry of entities created during a test, drained at teardown
//!
//! Identifiers are grouped per [`EntityCategory`] in category priority order,
//! so deletions always run children first no matter which entity a test
//! happened to create first.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DeletionFailure, Error, Result};
use crate::shape::Shape;
use crate::types::EntityCategory;

/// A ledger handed between the test body and the requesters of one worker
pub type SharedLedger = Arc<Mutex<CreationLedger>>;

/// Deletes a server-side entity by category and id
#[async_trait]
pub trait EntityDeleter: Send + Sync {
    async fn delete(&self, category: EntityCategory, id: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct CreationLedger {
    slots: Vec<(EntityCategory, BTreeSet<String>)>,
}

impl Default for CreationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CreationLedger {
    pub fn new() -> Self {
        Self {
            slots: EntityCategory::ALL
                .iter()
                .map(|category| (*category, BTreeSet::new()))
                .collect(),
        }
    }

    pub fn shared() -> SharedLedger {
        Arc::new(Mutex::new(Self::new()))
    }

    fn slot_mut(&mut self, category: EntityCategory) -> &mut BTreeSet<String> {
        &mut self.slots[category.priority()].1
    }

    /// Record a created entity. Returns whether the id was new; `None` is ignored.
    pub fn record_created(&mut self, category: EntityCategory, id: Option<&str>) -> bool {
        match id {
            Some(id) => {
                let added = self.slot_mut(category).insert(id.to_string());
                if added {
                    debug!("Recorded {} {} for cleanup", category, id);
                }
                added
            }
            None => false,
        }
    }

    /// Record an entity by its `id` field
    pub fn record_entity<T: Shape>(&mut self, category: EntityCategory, entity: &T) -> Result<bool> {
        let field = T::field("id").ok_or_else(|| {
            Error::Schema(format!(
                "Cannot record {} for cleanup: shape has no id field",
                T::KIND.name()
            ))
        })?;
        let id = field.read(entity).and_then(|value| value.as_identifier());
        Ok(self.record_created(category, id.as_deref()))
    }

    pub fn ids(&self, category: EntityCategory) -> impl Iterator<Item = &str> {
        self.slots[category.priority()].1.iter().map(String::as_str)
    }

    /// Everything awaiting deletion, in deletion order
    pub fn pending(&self) -> Vec<(EntityCategory, String)> {
        self.slots
            .iter()
            .flat_map(|(category, ids)| ids.iter().map(move |id| (*category, id.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().map(|(_, ids)| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|(_, ids)| ids.is_empty())
    }

    /// Snapshot the pending deletions and clear the ledger
    pub fn take(&mut self) -> Vec<(EntityCategory, String)> {
        let pending = self.pending();
        for (_, ids) in &mut self.slots {
            ids.clear();
        }
        pending
    }

    /// Delete everything recorded, best-effort.
    ///
    /// The ledger is cleared before the first deletion, so it is empty on
    /// return whatever the outcome. Every deletion is attempted; failures are
    /// collected into a single [`Error::Cleanup`].
    pub async fn drain_and_delete(&mut self, deleter: &dyn EntityDeleter) -> Result<usize> {
        let pending = self.take();
        delete_all(pending, deleter).await
    }
}

/// Drain a shared ledger without holding its lock across deletions
pub async fn drain_shared(ledger: &SharedLedger, deleter: &dyn EntityDeleter) -> Result<usize> {
    let pending = ledger.lock().take();
    delete_all(pending, deleter).await
}

async fn delete_all(pending: Vec<(EntityCategory, String)>, deleter: &dyn EntityDeleter) -> Result<usize> {
    if pending.is_empty() {
        return Ok(0);
    }

    info!("Deleting {} created entities...", pending.len());
    let mut deleted = 0;
    let mut failures = Vec::new();
    for (category, id) in pending {
        match deleter.delete(category, &id).await {
            Ok(()) => {
                debug!("Deleted {} {}", category, id);
                deleted += 1;
            }
            Err(e) => {
                warn!("Failed to delete {} {}: {:#}", category, id, e);
                failures.push(DeletionFailure {
                    category,
                    id,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    if failures.is_empty() {
        info!("Deleted {} entities", deleted);
        Ok(deleted)
    } else {
        Err(Error::Cleanup(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Build, Project, Role};

    #[derive(Default)]
    struct RecordingDeleter {
        calls: Mutex<Vec<(EntityCategory, String)>>,
        failing: Vec<&'static str>,
    }

    impl RecordingDeleter {
        fn failing(ids: &[&'static str]) -> Self {
            Self {
                failing: ids.to_vec(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(EntityCategory, String)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl EntityDeleter for RecordingDeleter {
        async fn delete(&self, category: EntityCategory, id: &str) -> anyhow::Result<()> {
            self.calls.lock().push((category, id.to_string()));
            if self.failing.iter().any(|failing| *failing == id) {
                anyhow::bail!("404 Not Found");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_duplicate_records_delete_once() {
        let mut ledger = CreationLedger::new();
        assert!(ledger.record_created(EntityCategory::Projects, Some("id1")));
        assert!(!ledger.record_created(EntityCategory::Projects, Some("id1")));
        assert_eq!(ledger.len(), 1);

        let deleter = RecordingDeleter::default();
        assert_eq!(ledger.drain_and_delete(&deleter).await.unwrap(), 1);
        assert_eq!(deleter.calls(), vec![(EntityCategory::Projects, "id1".to_string())]);
    }

    #[tokio::test]
    async fn test_null_ids_are_ignored() {
        let mut ledger = CreationLedger::new();
        assert!(!ledger.record_created(EntityCategory::Builds, None));
        assert!(ledger.is_empty());

        let deleter = RecordingDeleter::default();
        assert_eq!(ledger.drain_and_delete(&deleter).await.unwrap(), 0);
        assert!(deleter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drain_follows_category_priority() {
        let mut ledger = CreationLedger::new();
        ledger.record_created(EntityCategory::Projects, Some("project"));
        ledger.record_created(EntityCategory::BuildTypes, Some("build-type"));
        ledger.record_created(EntityCategory::Builds, Some("build"));

        let deleter = RecordingDeleter::default();
        ledger.drain_and_delete(&deleter).await.unwrap();

        assert_eq!(
            deleter.calls(),
            vec![
                (EntityCategory::Builds, "build".to_string()),
                (EntityCategory::BuildTypes, "build-type".to_string()),
                (EntityCategory::Projects, "project".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_drain_is_empty() {
        let mut ledger = CreationLedger::new();
        ledger.record_created(EntityCategory::Users, Some("alice"));

        let deleter = RecordingDeleter::default();
        ledger.drain_and_delete(&deleter).await.unwrap();
        assert_eq!(ledger.drain_and_delete(&deleter).await.unwrap(), 0);
        assert_eq!(deleter.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_drain() {
        let mut ledger = CreationLedger::new();
        ledger.record_created(EntityCategory::BuildTypes, Some("gone"));
        ledger.record_created(EntityCategory::Projects, Some("p1"));

        let deleter = RecordingDeleter::failing(&["gone"]);
        let err = ledger.drain_and_delete(&deleter).await.unwrap_err();

        assert_eq!(deleter.calls().len(), 2);
        assert!(ledger.is_empty());
        match err {
            Error::Cleanup(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].category, EntityCategory::BuildTypes);
                assert_eq!(failures[0].id, "gone");
                assert!(failures[0].reason.contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_shared_ledger_drain() {
        let ledger = CreationLedger::shared();
        ledger.lock().record_created(EntityCategory::Users, Some("u1"));
        ledger.lock().record_created(EntityCategory::BuildQueue, Some("42"));

        let deleter = RecordingDeleter::default();
        assert_eq!(drain_shared(&ledger, &deleter).await.unwrap(), 2);
        assert_eq!(deleter.calls()[0], (EntityCategory::BuildQueue, "42".to_string()));
        assert!(ledger.lock().is_empty());
    }

    #[test]
    fn test_record_entity_reads_id_field() {
        let mut ledger = CreationLedger::new();
        let project = Project {
            id: Some("p1".to_string()),
            ..Default::default()
        };
        assert!(ledger.record_entity(EntityCategory::Projects, &project).unwrap());
        assert!(!ledger.record_entity(EntityCategory::Builds, &Build::default()).unwrap());

        assert_eq!(ledger.ids(EntityCategory::Projects).collect::<Vec<_>>(), vec!["p1"]);
        assert_eq!(
            ledger.pending(),
            vec![(EntityCategory::Projects, "p1".to_string())]
        );
    }

    #[test]
    fn test_record_entity_without_id_field_fails() {
        let mut ledger = CreationLedger::new();
        let err = ledger
            .record_entity(EntityCategory::Users, &Role::default())
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
