//! Request specifications: base URL plus authentication mode

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::Serialize;
use tracing::debug;

use buildprobe_common::model::User;

use crate::config::ProbeConfig;
use crate::error::ApiResult;
use crate::response::ApiResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Basic { username: String, password: String },
}

/// How requests reach the server and who they act as
#[derive(Debug, Clone)]
pub struct RequestSpec {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl RequestSpec {
    fn build(config: &ProbeConfig, auth: Auth) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            auth,
        })
    }

    /// No credentials
    pub fn unauth(config: &ProbeConfig) -> ApiResult<Self> {
        Self::build(config, Auth::Anonymous)
    }

    /// Basic auth as `user`
    pub fn auth(config: &ProbeConfig, user: &User) -> ApiResult<Self> {
        Self::build(
            config,
            Auth::Basic {
                username: user.username_str().to_string(),
                password: user.password_str().to_string(),
            },
        )
    }

    /// Basic auth with an empty username and the super-user token as password
    pub fn super_user(config: &ProbeConfig) -> ApiResult<Self> {
        Self::build(
            config,
            Auth::Basic {
                username: String::new(),
                password: config.super_user_token.clone(),
            },
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the authenticated user, for logs
    pub fn principal(&self) -> &str {
        match &self.auth {
            Auth::Anonymous => "anonymous",
            Auth::Basic { username, .. } if username.is_empty() => "super-user",
            Auth::Basic { username, .. } => username.as_str(),
        }
    }

    /// Send a request and capture the response, whatever its status
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Auth::Basic { username, password } = &self.auth {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(body) = body {
            let json = serde_json::to_string(body)?;
            debug!("{} {} as {}: {}", method, url, self.principal(), json);
            request = request.body(json);
        } else {
            debug!("{} {} as {}", method, url, self.principal());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!("{} {} -> {}: {}", method, url, status, text);

        Ok(ApiResponse::new(method.to_string(), url, status, text))
    }

    pub async fn get(&self, path: &str) -> ApiResult<ApiResponse> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<ApiResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<ApiResponse> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<ApiResponse> {
        self.send::<()>(Method::DELETE, path, None).await
    }
}
