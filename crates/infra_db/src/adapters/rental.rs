//! PostgreSQL rental ledger adapter

use async_trait::async_trait;
use sqlx::PgPool;

use core_kernel::{DomainPort, Money, PortError, RentalId};
use domain_policy::RentalLedger;

use crate::repositories::RentalRepository;

#[derive(Debug, Clone)]
pub struct PostgresRentalLedger {
    repository: RentalRepository,
}

impl PostgresRentalLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RentalRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresRentalLedger {}

#[async_trait]
impl RentalLedger for PostgresRentalLedger {
    async fn record_insurance_premium(&self, rental_id: RentalId, premium: &Money) -> Result<(), PortError> {
        self.repository
            .set_insurance_premium(*rental_id.as_uuid(), premium.round_to_currency().amount())
            .await?;
        Ok(())
    }
}
