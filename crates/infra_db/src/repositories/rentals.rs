//! Rental premium write-back

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for the insurance columns of the `rentals` table
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: PgPool,
}

impl RentalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores the insurance premium on a rental
    ///
    /// Returns `NotFound` when the rental does not exist.
    pub async fn set_insurance_premium(&self, rental_id: Uuid, premium: Decimal) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE rentals
            SET insurance_premium = $2, updated_at = now()
            WHERE rental_id = $1
            "#,
        )
        .bind(rental_id)
        .bind(premium)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Rental", rental_id));
        }
        Ok(())
    }

    pub async fn insurance_premium(&self, rental_id: Uuid) -> Result<Option<Decimal>, DatabaseError> {
        let premium = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT insurance_premium FROM rentals WHERE rental_id = $1",
        )
        .bind(rental_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(premium.flatten())
    }
}
