//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the rental
//! insurance test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built renters, trips, credentials, and amounts
//! - `builders`: Builders for policy records and quote requests
//! - `database`: PostgreSQL testcontainer harness and seed helpers
//! - `assertions`: Assertion helpers for money, records, and errors
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
