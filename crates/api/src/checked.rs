//! Status-checked requesters returning typed models
//!
//! A successful create records the new entity into the worker's ledger
//! before the model is returned, so tests never forget a cleanup.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use buildprobe_common::model::{Build, BuildType, Project, User};
use buildprobe_common::{EntityCategory, EntityDeleter, Shape, SharedLedger};

use crate::error::{ApiError, ApiResult};
use crate::requester::Requester;
use crate::response::ResponseExpectation;
use crate::spec::RequestSpec;

pub struct CheckedRequester<T> {
    inner: Requester,
    ledger: SharedLedger,
    _model: PhantomData<fn() -> T>,
}

impl<T> CheckedRequester<T>
where
    T: Shape + DeserializeOwned,
{
    pub fn new(spec: RequestSpec, category: EntityCategory, ledger: SharedLedger) -> Self {
        Self {
            inner: Requester::new(spec, category),
            ledger,
            _model: PhantomData,
        }
    }

    pub fn category(&self) -> EntityCategory {
        self.inner.category()
    }

    /// Create an entity (expects 200) and record it for cleanup
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> ApiResult<T> {
        let created: T = self
            .inner
            .create(body)
            .await?
            .expect(&ResponseExpectation::ok())?
            .json()?;
        self.ledger.lock().record_entity(self.category(), &created)?;
        info!("Created {} via API", self.category());
        Ok(created)
    }

    pub async fn read(&self, id: &str) -> ApiResult<T> {
        self.inner
            .read(id)
            .await?
            .expect(&ResponseExpectation::ok())?
            .json()
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> ApiResult<T> {
        self.inner
            .update(id, body)
            .await?
            .expect(&ResponseExpectation::ok())?
            .json()
    }

    /// Delete (expects 204) and return the raw body
    pub async fn delete(&self, id: &str) -> ApiResult<String> {
        let response = self
            .inner
            .delete(id)
            .await?
            .expect(&ResponseExpectation::no_content())?;
        Ok(response.body().to_string())
    }

    /// All entities of this category; an absent list means none
    pub async fn search(&self) -> ApiResult<Vec<T>> {
        let page: serde_json::Value = self
            .inner
            .search()
            .await?
            .expect(&ResponseExpectation::ok())?
            .json()?;
        match page.get(self.category().search_key()) {
            Some(items) => Ok(serde_json::from_value(items.clone())?),
            None => Ok(Vec::new()),
        }
    }
}

/// Typed, status-checked access to every category for one request spec
#[derive(Clone)]
pub struct CheckedRequesters {
    spec: RequestSpec,
    ledger: SharedLedger,
}

impl CheckedRequesters {
    pub fn new(spec: RequestSpec, ledger: SharedLedger) -> Self {
        Self { spec, ledger }
    }

    pub fn request<T: Shape + DeserializeOwned>(&self, category: EntityCategory) -> ApiResult<CheckedRequester<T>> {
        if category.shape() != T::KIND {
            return Err(ApiError::Config(format!(
                "{} carries {}, not {}",
                category,
                category.shape().name(),
                T::KIND.name()
            )));
        }
        Ok(CheckedRequester::new(self.spec.clone(), category, self.ledger.clone()))
    }

    pub fn projects(&self) -> CheckedRequester<Project> {
        CheckedRequester::new(self.spec.clone(), EntityCategory::Projects, self.ledger.clone())
    }

    pub fn build_types(&self) -> CheckedRequester<BuildType> {
        CheckedRequester::new(self.spec.clone(), EntityCategory::BuildTypes, self.ledger.clone())
    }

    pub fn users(&self) -> CheckedRequester<User> {
        CheckedRequester::new(self.spec.clone(), EntityCategory::Users, self.ledger.clone())
    }

    pub fn builds(&self) -> CheckedRequester<Build> {
        CheckedRequester::new(self.spec.clone(), EntityCategory::Builds, self.ledger.clone())
    }
}

#[async_trait]
impl EntityDeleter for CheckedRequesters {
    async fn delete(&self, category: EntityCategory, id: &str) -> anyhow::Result<()> {
        Requester::new(self.spec.clone(), category)
            .delete(id)
            .await?
            .expect(&ResponseExpectation::no_content())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use buildprobe_common::model::NewProjectDescription;
    use buildprobe_common::CreationLedger;
    use mockito::Server;

    fn checked(server: &Server, ledger: SharedLedger) -> CheckedRequesters {
        let config = ProbeConfig {
            host: server.url(),
            super_user_token: "token".to_string(),
            ..Default::default()
        };
        CheckedRequesters::new(RequestSpec::super_user(&config).unwrap(), ledger)
    }

    #[tokio::test]
    async fn test_create_records_entity_in_ledger() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/app/rest/projects")
            .with_status(200)
            .with_body(r#"{"id": "test_abc", "name": "test_name", "parentProjectId": "_Root"}"#)
            .create_async()
            .await;

        let ledger = CreationLedger::shared();
        let requesters = checked(&server, ledger.clone());
        let body = NewProjectDescription {
            id: Some("test_abc".to_string()),
            name: Some("test_name".to_string()),
            ..Default::default()
        };

        let project = requesters.projects().create(&body).await.unwrap();
        assert_eq!(project.id_str(), "test_abc");
        assert_eq!(
            ledger.lock().pending(),
            vec![(EntityCategory::Projects, "test_abc".to_string())]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_create_records_nothing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/app/rest/buildTypes")
            .with_status(400)
            .with_body("Build configuration ID \"x\" is already used by another configuration")
            .create_async()
            .await;

        let ledger = CreationLedger::shared();
        let err = checked(&server, ledger.clone())
            .build_types()
            .create(&BuildType::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UnexpectedStatus { actual: 400, .. }));
        assert!(ledger.lock().is_empty());
    }

    #[tokio::test]
    async fn test_numeric_user_ids_are_recorded() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/app/rest/users")
            .with_status(200)
            .with_body(r#"{"id": 7, "username": "test_user"}"#)
            .create_async()
            .await;

        let ledger = CreationLedger::shared();
        let user = checked(&server, ledger.clone())
            .users()
            .create(&User::default())
            .await
            .unwrap();

        assert_eq!(user.id.as_deref(), Some("7"));
        assert_eq!(ledger.lock().ids(EntityCategory::Users).collect::<Vec<_>>(), vec!["7"]);
    }

    #[tokio::test]
    async fn test_search_reads_list_under_search_key() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/app/rest/projects")
            .with_status(200)
            .with_body(r#"{"count": 2, "project": [{"id": "_Root"}, {"id": "p1", "name": "Demo"}]}"#)
            .create_async()
            .await;
        let _empty = server
            .mock("GET", "/app/rest/buildTypes")
            .with_status(200)
            .with_body(r#"{"count": 0}"#)
            .create_async()
            .await;

        let requesters = checked(&server, CreationLedger::shared());
        let projects = requesters.projects().search().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name.as_deref(), Some("Demo"));

        assert!(requesters.build_types().search().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checked_delete_expects_no_content() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/app/rest/projects/id:p1")
            .with_status(404)
            .create_async()
            .await;

        let requesters = checked(&server, CreationLedger::shared());
        assert!(requesters.projects().delete("p1").await.is_err());
        assert!(EntityDeleter::delete(&requesters, EntityCategory::Projects, "p1")
            .await
            .is_err());
    }

    #[test]
    fn test_request_rejects_mismatched_shape() {
        let config = ProbeConfig::default();
        let requesters = CheckedRequesters::new(RequestSpec::unauth(&config).unwrap(), CreationLedger::shared());
        assert!(requesters.request::<Build>(EntityCategory::BuildQueue).is_ok());
        assert!(requesters.request::<Project>(EntityCategory::Users).is_err());
    }
}
