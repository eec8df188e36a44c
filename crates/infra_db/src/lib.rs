//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the rental insurance pipeline using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`]: SQL and row types, one repository per table group
//! - [`adapters`]: implementations of the `domain_policy` ports on top of
//!   the repositories
//! - [`pool`]: connection pool setup and migrations
//!
//! Policy record status changes are conditional updates guarded on the
//! current status, which makes the payment claim safe across processes,
//! not just across tasks.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresPolicyRecordAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/rental_insurance")).await?;
//! run_migrations(&pool).await?;
//! let records = PostgresPolicyRecordAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{
    PostgresEmailOutbox, PostgresNotificationInbox, PostgresPolicyRecordAdapter,
    PostgresRentalLedger, PostgresTenantAdapter,
};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
