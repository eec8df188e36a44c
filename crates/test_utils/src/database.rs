//! Database Test Utilities
//!
//! A PostgreSQL testcontainer with the workspace schema applied, plus seed
//! helpers for the booking-side tables the pipeline reads. Tests using this
//! module need Docker and are `#[ignore]`d by default.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;
use tokio::sync::OnceCell;
use uuid::Uuid;

use core_kernel::{CustomerId, RentalId, TenantId, UserId};
use domain_policy::{TenantBranding, TenantCredentials};

const POSTGRES_USER: &str = "postgres";
const POSTGRES_PASSWORD: &str = "postgres";
const POSTGRES_DB: &str = "postgres";

const SCHEMA: &str = include_str!("../../../migrations/20240101_000001_initial_schema.sql");

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A PostgreSQL container with the schema applied
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the initial migration
    pub async fn new() -> TestResult<Self> {
        let container = Postgres::default().start().await?;
        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all data while preserving the schema
    pub async fn clear_data(&self) -> TestResult<()> {
        sqlx::raw_sql(
            "TRUNCATE email_outbox, notifications, policy_records, rentals, \
             tenant_admins, tenant_insurance_settings, tenants CASCADE",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a tenant with branding
    pub async fn seed_tenant(&self, branding: &TenantBranding) -> TestResult<TenantId> {
        let tenant_id = TenantId::new();
        sqlx::query("INSERT INTO tenants (tenant_id, name, support_email, accent_color) VALUES ($1, $2, $3, $4)")
            .bind(*tenant_id.as_uuid())
            .bind(&branding.tenant_name)
            .bind(&branding.support_email)
            .bind(&branding.accent_color)
            .execute(&self.pool)
            .await?;
        Ok(tenant_id)
    }

    /// Stores underwriting credentials for a tenant
    pub async fn seed_credentials(
        &self,
        tenant_id: TenantId,
        credentials: &TenantCredentials,
        enabled: bool,
    ) -> TestResult<()> {
        sqlx::query(
            "INSERT INTO tenant_insurance_settings (tenant_id, username, password, mode, is_enabled) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*tenant_id.as_uuid())
        .bind(&credentials.username)
        .bind(credentials.password())
        .bind(credentials.mode.as_str())
        .bind(enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn seed_admin(&self, tenant_id: TenantId, email: &str, active: bool) -> TestResult<UserId> {
        let user_id = UserId::new();
        sqlx::query(
            "INSERT INTO tenant_admins (user_id, tenant_id, email, display_name, is_active) \
             VALUES ($1, $2, $3, NULL, $4)",
        )
        .bind(*user_id.as_uuid())
        .bind(*tenant_id.as_uuid())
        .bind(email)
        .bind(active)
        .execute(&self.pool)
        .await?;
        Ok(user_id)
    }

    pub async fn seed_rental(&self, tenant_id: TenantId) -> TestResult<RentalId> {
        let rental_id = RentalId::new();
        sqlx::query("INSERT INTO rentals (rental_id, tenant_id, customer_id) VALUES ($1, $2, $3)")
            .bind(*rental_id.as_uuid())
            .bind(*tenant_id.as_uuid())
            .bind(Uuid::from(CustomerId::new()))
            .execute(&self.pool)
            .await?;
        Ok(rental_id)
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or creates a container shared by every test in the binary
///
/// # Panics
///
/// Panics if the database fails to initialize
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Creates an isolated database for a test that needs a clean slate
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}
