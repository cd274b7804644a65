//! BuildProbe API Layer
//!
//! Thin wrappers over the server's REST API: request specs per
//! authentication mode, expected-response checks, unchecked and
//! status-checked requesters per entity category, and the server
//! auth-settings fixture.

pub mod checked;
pub mod config;
pub mod error;
pub mod requester;
pub mod response;
pub mod server_auth;
pub mod spec;

pub use checked::{CheckedRequester, CheckedRequesters};
pub use config::ProbeConfig;
pub use error::{ApiError, ApiResult};
pub use requester::{Requester, Requesters};
pub use response::{ApiResponse, ResponseExpectation};
pub use server_auth::{AuthSettingsFixture, ServerAuthSettingsRequester};
pub use spec::RequestSpec;
