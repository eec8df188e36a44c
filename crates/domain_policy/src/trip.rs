//! Trip window of the rental being insured

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Rental trip window and pickup region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDetails {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Two-letter region code or full region name of the pickup location
    pub pickup_state: String,
}

impl TripDetails {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, pickup_state: impl Into<String>) -> Self {
        Self {
            start,
            end,
            pickup_state: pickup_state.into(),
        }
    }

    /// Billable days: partial days round up, and every trip bills at least one day
    pub fn rental_days(&self) -> u32 {
        let seconds = (self.end - self.start).num_seconds();
        if seconds <= 0 {
            return 1;
        }
        let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
        u32::try_from(days).unwrap_or(u32::MAX).max(1)
    }

    /// Rejects windows that do not end after they start
    pub fn validate_window(&self) -> Result<(), PolicyError> {
        if self.end <= self.start {
            return Err(PolicyError::validation(
                "trip end must be after trip start",
            ));
        }
        Ok(())
    }

    /// Window check plus a pickup region, as a quote requires
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.validate_window()?;
        if self.pickup_state.trim().is_empty() {
            return Err(PolicyError::validation("pickup state is required"));
        }
        Ok(())
    }
}
