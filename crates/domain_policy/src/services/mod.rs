//! Insurance pipeline services
//!
//! The services orchestrate the ports: [`QuoteService`] creates policy
//! records, [`PaymentService`] drives them to completion, and
//! [`NotificationService`] tells tenant administrators when the provider
//! account runs dry.

mod notification;
mod payment;
mod quote;

pub use notification::{NotificationReport, NotificationService};
pub use payment::{PaymentConfirmation, PaymentPorts, PaymentService};
pub use quote::{PremiumSource, QuotePorts, QuoteRequest, QuoteResult, QuoteService};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{TokenCache, DEFAULT_TOKEN_TTL_SECS};

/// Default lease after which a pending payment claim may be taken over
pub const DEFAULT_CLAIM_LEASE_SECS: i64 = 300;

/// Timing knobs shared by the pipeline services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Lifetime of cached provider tokens
    pub token_ttl_secs: i64,
    /// Age after which a `PaymentPending` claim counts as abandoned
    pub payment_claim_lease_secs: i64,
    /// How often a caller that lost the claim race re-reads the record
    pub settle_poll_attempts: u32,
    pub settle_poll_interval_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            payment_claim_lease_secs: DEFAULT_CLAIM_LEASE_SECS,
            settle_poll_attempts: 5,
            settle_poll_interval_ms: 400,
        }
    }
}

impl PipelineSettings {
    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_secs)
    }

    pub fn payment_claim_lease(&self) -> Duration {
        Duration::seconds(self.payment_claim_lease_secs)
    }

    pub fn settle_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_poll_interval_ms)
    }

    /// Builds the token cache these settings describe
    pub fn token_cache(&self) -> TokenCache {
        TokenCache::new(self.token_ttl())
    }
}
