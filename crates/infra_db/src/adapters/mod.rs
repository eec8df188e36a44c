//! Domain Adapters
//!
//! Implementations of the `domain_policy` ports backed by PostgreSQL. Each
//! adapter wraps a repository, translates rows into domain types, and turns
//! [`DatabaseError`](crate::DatabaseError) into `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresPolicyRecordAdapter, PostgresTenantAdapter};
//!
//! let credentials = Arc::new(PostgresTenantAdapter::new(pool.clone()));
//! let records = Arc::new(PostgresPolicyRecordAdapter::new(pool));
//! ```

pub mod notification;
pub mod policy_record;
pub mod rental;
pub mod tenant;

pub use notification::{PostgresEmailOutbox, PostgresNotificationInbox};
pub use policy_record::PostgresPolicyRecordAdapter;
pub use rental::PostgresRentalLedger;
pub use tenant::PostgresTenantAdapter;
