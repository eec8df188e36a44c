//! Repository implementations
//!
//! Repositories own the SQL and speak in row types. They know nothing about
//! domain types; the adapters in [`crate::adapters`] translate.

pub mod notifications;
pub mod policy_records;
pub mod rentals;
pub mod tenants;

pub use notifications::NotificationRepository;
pub use policy_records::PolicyRecordRepository;
pub use rentals::RentalRepository;
pub use tenants::TenantRepository;
