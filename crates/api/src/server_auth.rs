//! Server authentication settings and the suite-level fixture around them

use tracing::info;

use buildprobe_common::generator::generate;
use buildprobe_common::model::{AuthModules, ServerAuthSettings};

use crate::error::ApiResult;
use crate::response::{ApiResponse, ResponseExpectation};
use crate::spec::RequestSpec;

pub const SERVER_AUTH_SETTINGS_PATH: &str = "/app/rest/server/authSettings";

/// Read and update `/app/rest/server/authSettings`
#[derive(Debug, Clone)]
pub struct ServerAuthSettingsRequester {
    spec: RequestSpec,
}

impl ServerAuthSettingsRequester {
    pub fn new(spec: RequestSpec) -> Self {
        Self { spec }
    }

    pub async fn read_raw(&self) -> ApiResult<ApiResponse> {
        self.spec.get(SERVER_AUTH_SETTINGS_PATH).await
    }

    pub async fn update_raw(&self, settings: &ServerAuthSettings) -> ApiResult<ApiResponse> {
        self.spec.put(SERVER_AUTH_SETTINGS_PATH, settings).await
    }

    pub async fn read(&self) -> ApiResult<ServerAuthSettings> {
        self.read_raw().await?.expect(&ResponseExpectation::ok())?.json()
    }

    pub async fn update(&self, settings: &ServerAuthSettings) -> ApiResult<ServerAuthSettings> {
        self.update_raw(settings)
            .await?
            .expect(&ResponseExpectation::ok())?
            .json()
    }
}

/// Turns on per-project permissions for a test suite and puts the previous
/// value back afterwards.
#[derive(Debug)]
pub struct AuthSettingsFixture {
    requester: ServerAuthSettingsRequester,
    previous: Option<bool>,
}

impl AuthSettingsFixture {
    pub async fn enable(spec: RequestSpec) -> ApiResult<Self> {
        let requester = ServerAuthSettingsRequester::new(spec);
        let previous = requester.read().await?.per_project_permissions;

        requester.update(&Self::settings(Some(true))?).await?;
        info!(
            "Enabled per-project permissions (was {})",
            previous.map_or("unset".to_string(), |v| v.to_string())
        );

        Ok(Self {
            requester,
            previous,
        })
    }

    pub fn previous(&self) -> Option<bool> {
        self.previous
    }

    pub async fn restore(self) -> ApiResult<ServerAuthSettings> {
        let restored = self.requester.update(&Self::settings(self.previous)?).await?;
        info!("Restored per-project permissions");
        Ok(restored)
    }

    fn settings(per_project_permissions: Option<bool>) -> ApiResult<ServerAuthSettings> {
        Ok(ServerAuthSettings {
            per_project_permissions,
            modules: Some(generate::<AuthModules>(&[])?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_fixture_enables_then_restores() {
        let mut server = Server::new_async().await;
        let read = server
            .mock("GET", SERVER_AUTH_SETTINGS_PATH)
            .with_status(200)
            .with_body(r#"{"perProjectPermissions": false, "modules": {"module": []}}"#)
            .expect(1)
            .create_async()
            .await;
        let enable = server
            .mock("PUT", SERVER_AUTH_SETTINGS_PATH)
            .match_body(Matcher::Json(serde_json::json!({
                "perProjectPermissions": true,
                "modules": {"module": [{"name": "HTTP-Basic"}]}
            })))
            .with_status(200)
            .with_body(r#"{"perProjectPermissions": true}"#)
            .expect(1)
            .create_async()
            .await;
        let restore = server
            .mock("PUT", SERVER_AUTH_SETTINGS_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "perProjectPermissions": false
            })))
            .with_status(200)
            .with_body(r#"{"perProjectPermissions": false}"#)
            .expect(1)
            .create_async()
            .await;

        let config = ProbeConfig {
            host: server.url(),
            ..Default::default()
        };
        let fixture = AuthSettingsFixture::enable(RequestSpec::super_user(&config).unwrap())
            .await
            .unwrap();
        assert_eq!(fixture.previous(), Some(false));

        let restored = fixture.restore().await.unwrap();
        assert_eq!(restored.per_project_permissions, Some(false));

        read.assert_async().await;
        enable.assert_async().await;
        restore.assert_async().await;
    }
}
