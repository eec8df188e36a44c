//! Tenant configuration repository
//!
//! Read-only access to the booking side's tenant tables: underwriting
//! credentials, active administrators, and branding.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for tenant settings, admins, and branding
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enabled underwriting settings for a tenant
    ///
    /// Disabled settings and settings with a blank username or password
    /// are treated as absent.
    pub async fn find_insurance_settings(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<InsuranceSettingsRow>, DatabaseError> {
        let row = sqlx::query_as::<_, InsuranceSettingsRow>(
            r#"
            SELECT tenant_id, username, password, mode
            FROM tenant_insurance_settings
            WHERE tenant_id = $1
              AND is_enabled
              AND btrim(username) <> ''
              AND btrim(password) <> ''
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Active administrators in a stable order
    pub async fn active_admins(&self, tenant_id: Uuid) -> Result<Vec<TenantAdminRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, TenantAdminRow>(
            r#"
            SELECT user_id, email, display_name
            FROM tenant_admins
            WHERE tenant_id = $1 AND is_active
            ORDER BY created_at, user_id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_branding(&self, tenant_id: Uuid) -> Result<Option<BrandingRow>, DatabaseError> {
        let row = sqlx::query_as::<_, BrandingRow>(
            "SELECT name, support_email, accent_color FROM tenants WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsuranceSettingsRow {
    pub tenant_id: Uuid,
    pub username: String,
    pub password: String,
    pub mode: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenantAdminRow {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandingRow {
    pub name: String,
    pub support_email: Option<String>,
    pub accent_color: Option<String>,
}
