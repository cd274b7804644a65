//! Captured responses and their expected status/body

use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    method: String,
    url: String,
    status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(method: String, url: String, status: u16, body: String) -> Self {
        Self {
            method,
            url,
            status,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail unless the response matches `expectation`
    pub fn expect(self, expectation: &ResponseExpectation) -> ApiResult<Self> {
        if self.status != expectation.status {
            return Err(ApiError::UnexpectedStatus {
                method: self.method,
                url: self.url,
                expected: expectation.status,
                actual: self.status,
                body: self.body,
            });
        }
        if let Some(fragment) = expectation.body_contains {
            if !self.body.contains(fragment) {
                return Err(ApiError::UnexpectedBody {
                    method: self.method,
                    url: self.url,
                    expected: fragment.to_string(),
                    body: self.body,
                });
            }
        }
        Ok(self)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Expected status code and, optionally, a body fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseExpectation {
    pub status: u16,
    pub body_contains: Option<&'static str>,
}

impl ResponseExpectation {
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            body_contains: None,
        }
    }

    pub const fn with_body(status: u16, fragment: &'static str) -> Self {
        Self {
            status,
            body_contains: Some(fragment),
        }
    }

    pub const fn ok() -> Self {
        Self::status(200)
    }

    pub const fn no_content() -> Self {
        Self::status(204)
    }

    pub const fn bad_request() -> Self {
        Self::status(400)
    }

    pub const fn bad_request_with_duplicate_id() -> Self {
        Self::with_body(400, "is already used by another")
    }

    pub const fn unauthorized() -> Self {
        Self::status(401)
    }

    pub const fn forbidden_with_access_denied() -> Self {
        Self::with_body(403, "Access denied")
    }

    pub const fn not_found_with_entity_not_found() -> Self {
        Self::with_body(404, "Could not find the entity requested")
    }

    pub const fn internal_server_error() -> Self {
        Self::status(500)
    }
}
