//! Outbound Adapters
//!
//! HTTP adapters for the systems the pipeline calls out to. Today that is
//! the underwriting provider: [`HttpUnderwritingProvider`] implements
//! `domain_policy::UnderwritingProvider` over reqwest, decoding the
//! provider's `{status, txt, data}` envelope into the typed
//! `ProviderResponse` at this boundary.
//!
//! # Error mapping
//!
//! - HTTP 401/403 on an authenticated call -> `PortError::Unauthorized`
//! - Elapsed request deadline -> `PortError::Timeout`
//! - Connection failures and HTTP 5xx -> `PortError::Connection` /
//!   `PortError::ServiceUnavailable`
//! - Non-zero envelope status -> `ProviderResponse::ProviderError`

pub mod config;
pub mod underwriting;
mod wire;

pub use config::ProviderEndpoints;
pub use underwriting::HttpUnderwritingProvider;
