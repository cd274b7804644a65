//! Unchecked requesters: send the request, hand back whatever came back

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use buildprobe_common::{EntityCategory, EntityDeleter};

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::spec::RequestSpec;

/// CRUD and search calls for one entity category
#[derive(Debug, Clone)]
pub struct Requester {
    spec: RequestSpec,
    category: EntityCategory,
}

impl Requester {
    pub fn new(spec: RequestSpec, category: EntityCategory) -> Self {
        Self { spec, category }
    }

    pub fn category(&self) -> EntityCategory {
        self.category
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/id:{}", self.category.path(), id)
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> ApiResult<ApiResponse> {
        self.spec.post(self.category.path(), body).await
    }

    pub async fn read(&self, id: &str) -> ApiResult<ApiResponse> {
        self.spec.get(&self.item_path(id)).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> ApiResult<ApiResponse> {
        self.spec.put(&self.item_path(id), body).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<ApiResponse> {
        self.spec.delete(&self.item_path(id)).await
    }

    pub async fn search(&self) -> ApiResult<ApiResponse> {
        self.spec.get(self.category.path()).await
    }
}

/// One unchecked requester per category, sharing a request spec
#[derive(Debug, Clone)]
pub struct Requesters {
    requesters: Vec<Requester>,
}

impl Requesters {
    pub fn new(spec: RequestSpec) -> Self {
        Self {
            requesters: EntityCategory::ALL
                .iter()
                .map(|category| Requester::new(spec.clone(), *category))
                .collect(),
        }
    }

    pub fn get(&self, category: EntityCategory) -> &Requester {
        &self.requesters[category.priority()]
    }
}

#[async_trait]
impl EntityDeleter for Requesters {
    /// A non-2xx answer is logged, not raised: the entity may already be gone
    async fn delete(&self, category: EntityCategory, id: &str) -> anyhow::Result<()> {
        let response = self.get(category).delete(id).await?;
        if response.is_success() {
            info!("Deleted {} {}", category, id);
        } else {
            warn!(
                "Delete of {} {} returned {}: {}",
                category,
                id,
                response.status(),
                response.body()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use buildprobe_common::CreationLedger;
    use mockito::Server;

    fn requesters(server: &Server) -> Requesters {
        let config = ProbeConfig {
            host: server.url(),
            super_user_token: "token".to_string(),
            ..Default::default()
        };
        Requesters::new(RequestSpec::super_user(&config).unwrap())
    }

    #[tokio::test]
    async fn test_paths_per_operation() {
        let mut server = Server::new_async().await;
        let read = server
            .mock("GET", "/app/rest/buildTypes/id:bt1")
            .with_status(200)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/app/rest/buildTypes/id:bt1")
            .with_status(200)
            .create_async()
            .await;
        let search = server
            .mock("GET", "/app/rest/buildTypes")
            .with_status(200)
            .create_async()
            .await;

        let requesters = requesters(&server);
        let build_types = requesters.get(EntityCategory::BuildTypes);
        assert_eq!(build_types.category(), EntityCategory::BuildTypes);
        build_types.read("bt1").await.unwrap();
        build_types.update("bt1", &serde_json::json!({})).await.unwrap();
        build_types.search().await.unwrap();

        read.assert_async().await;
        update.assert_async().await;
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_unchecked_delete_tolerates_missing_entities() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/app/rest/projects/id:gone")
            .with_status(404)
            .with_body("Could not find the entity requested")
            .expect(1)
            .create_async()
            .await;

        let requesters = requesters(&server);
        EntityDeleter::delete(&requesters, EntityCategory::Projects, "gone")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ledger_drain_deletes_children_first() {
        let mut server = Server::new_async().await;
        let build_type = server
            .mock("DELETE", "/app/rest/buildTypes/id:bt1")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let project = server
            .mock("DELETE", "/app/rest/projects/id:p1")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let mut ledger = CreationLedger::new();
        ledger.record_created(EntityCategory::Projects, Some("p1"));
        ledger.record_created(EntityCategory::BuildTypes, Some("bt1"));
        ledger.record_created(EntityCategory::BuildTypes, Some("bt1"));

        let deleted = ledger.drain_and_delete(&requesters(&server)).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(ledger.is_empty());
        build_type.assert_async().await;
        project.assert_async().await;
    }
}
