//! Core Kernel - Foundational types for the rental insurance pipeline
//!
//! This crate provides the building blocks shared by the domain and
//! infrastructure crates:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for tenants, rentals, and policy records
//! - Port primitives for the hexagonal adapters (errors, health checks)

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    PolicyRecordId, RentalId, TenantId, CustomerId, UserId, NotificationId,
};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
};
