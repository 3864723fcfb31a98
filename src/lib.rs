//! `companycam-http` is an async HTTP client for the CompanyCam REST API.
//!
//! [`CompanyCamClient`] authenticates with a bearer token and exposes:
//! - [`CompanyCamClient::get`], [`CompanyCamClient::post`],
//!   [`CompanyCamClient::put`], [`CompanyCamClient::delete`]
//! - [`CompanyCamClient::send`] for requests carrying a deadline
//! - endpoint helpers such as [`CompanyCamClient::search_projects`]
//!
//! Transport failures and HTTP 429 are retried with exponential backoff
//! (429 backoff is jittered). Every other non-success status is returned at
//! once as [`CompanyCamError::Api`]. Responses are untyped
//! [`serde_json::Value`]s.

mod client;
mod error;
mod options;
mod request;
mod resources;
mod retry;
pub mod transport;

pub use client::CompanyCamClient;
pub use error::CompanyCamError;
pub use options::{ClientOptions, DEFAULT_BASE_URL, TOKEN_ENV};
pub use request::{ApiRequest, Query};
pub use resources::{iso_to_unix, Page, PhotoFilter};
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, CompanyCamError>;
