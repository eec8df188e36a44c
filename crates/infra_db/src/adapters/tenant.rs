//! PostgreSQL tenant adapter
//!
//! Serves both tenant-facing ports: [`CredentialStore`] and
//! [`AdminDirectory`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, PortError, TenantId, UserId};
use domain_policy::{
    AdminDirectory, CredentialStore, ProviderMode, TenantAdmin, TenantBranding, TenantCredentials,
};

use crate::repositories::TenantRepository;

#[derive(Debug, Clone)]
pub struct PostgresTenantAdapter {
    repository: TenantRepository,
}

impl PostgresTenantAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: TenantRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresTenantAdapter {}

#[async_trait]
impl CredentialStore for PostgresTenantAdapter {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn find_credentials(&self, tenant_id: TenantId) -> Result<Option<TenantCredentials>, PortError> {
        let settings = self
            .repository
            .find_insurance_settings(*tenant_id.as_uuid())
            .await?;

        Ok(settings.map(|row| {
            let mode = ProviderMode::from_stored(&row.mode);
            debug!(mode = %mode, "Resolved tenant credentials");
            TenantCredentials::new(row.username, row.password, mode)
        }))
    }
}

#[async_trait]
impl AdminDirectory for PostgresTenantAdapter {
    async fn admins(&self, tenant_id: TenantId) -> Result<Vec<TenantAdmin>, PortError> {
        let rows = self.repository.active_admins(*tenant_id.as_uuid()).await?;
        Ok(rows
            .into_iter()
            .map(|row| TenantAdmin {
                user_id: UserId::from_uuid(row.user_id),
                email: row.email,
                display_name: row.display_name,
            })
            .collect())
    }

    async fn branding(&self, tenant_id: TenantId) -> Result<TenantBranding, PortError> {
        let defaults = TenantBranding::default();
        let Some(row) = self.repository.find_branding(*tenant_id.as_uuid()).await? else {
            return Ok(defaults);
        };

        Ok(TenantBranding {
            tenant_name: non_blank(Some(row.name)).unwrap_or(defaults.tenant_name),
            support_email: non_blank(row.support_email),
            accent_color: non_blank(row.accent_color).unwrap_or(defaults.accent_color),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
