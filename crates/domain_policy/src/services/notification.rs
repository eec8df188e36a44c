//! Low-balance notifications for tenant administrators
//!
//! Copy lives in a Fluent resource so it can be reviewed without reading
//! Rust. Each call fans out one in-app notice per administrator and one
//! email addressed to all of them. Deciding *when* to call is the payment
//! service's job: once per low-balance episode.

use std::sync::Arc;

use chrono::Utc;
use fluent::{FluentArgs, FluentBundle, FluentResource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use unic_langid::langid;

use core_kernel::{Money, NotificationId, TenantId};

use crate::aggregate::PolicyRecord;
use crate::error::PolicyError;
use crate::ports::{
    AdminDirectory, EmailDispatcher, InAppNotification, NotificationInbox, OutboundEmail,
    TenantBranding, INSUFFICIENT_BALANCE_KIND,
};

const INSUFFICIENT_BALANCE_FTL: &str = include_str!("../templates/insufficient_balance.ftl");

/// What a notification run delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReport {
    pub in_app: usize,
    pub emails: usize,
}

/// Fans out low-balance notices to tenant administrators
pub struct NotificationService {
    directory: Arc<dyn AdminDirectory>,
    inbox: Arc<dyn NotificationInbox>,
    email: Arc<dyn EmailDispatcher>,
}

impl NotificationService {
    pub fn new(
        directory: Arc<dyn AdminDirectory>,
        inbox: Arc<dyn NotificationInbox>,
        email: Arc<dyn EmailDispatcher>,
    ) -> Self {
        Self {
            directory,
            inbox,
            email,
        }
    }

    /// Tells every administrator of `tenant_id` that `record` could not be
    /// activated for lack of provider funds
    #[instrument(skip(self, record), fields(tenant_id = %tenant_id, policy_record_id = %record.id()))]
    pub async fn notify_insufficient_balance(
        &self,
        tenant_id: TenantId,
        record: &PolicyRecord,
        observed_balance: Option<Decimal>,
    ) -> Result<NotificationReport, PolicyError> {
        let admins = self.directory.admins(tenant_id).await?;
        if admins.is_empty() {
            warn!("Tenant has no administrators to notify about insufficient balance");
            return Ok(NotificationReport::default());
        }

        let branding = match self.directory.branding(tenant_id).await {
            Ok(branding) => branding,
            Err(e) => {
                warn!(error = %e, "Falling back to default branding");
                TenantBranding::default()
            }
        };

        let premium = record.premium_amount();
        let balance = observed_balance
            .map(|b| Money::new(b, premium.currency()).round_to_currency().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut args = FluentArgs::new();
        args.set("rental", record.rental_id().to_string());
        args.set("record", record.id().to_string());
        args.set("premium", premium.to_string());
        args.set("balance", balance);
        args.set("tenant", branding.tenant_name.clone());
        args.set("accent", branding.accent_color.clone());
        args.set(
            "support",
            branding
                .support_email
                .clone()
                .unwrap_or_else(|| "your platform support team".to_string()),
        );

        let title = render("insufficient-balance-title", &args)?;
        let message = render("insufficient-balance-message", &args)?;
        let subject = render("insufficient-balance-subject", &args)?;
        let body = render("insufficient-balance-body", &args)?;

        let mut report = NotificationReport::default();
        let now = Utc::now();
        for admin in &admins {
            let notification = InAppNotification {
                id: NotificationId::new_v7(),
                tenant_id,
                user_id: admin.user_id,
                kind: INSUFFICIENT_BALANCE_KIND.to_string(),
                title: title.clone(),
                message: message.clone(),
                rental_id: record.rental_id(),
                policy_record_id: record.id(),
                observed_balance,
                required_premium: premium.amount(),
                created_at: now,
            };
            match self.inbox.create(&notification).await {
                Ok(()) => report.in_app += 1,
                Err(e) => warn!(error = %e, user_id = %admin.user_id, "Failed to create in-app notification"),
            }
        }

        let recipients: Vec<String> = admins
            .iter()
            .map(|a| a.email.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if !recipients.is_empty() {
            let email = OutboundEmail {
                tenant_id,
                to: recipients,
                subject,
                body,
            };
            self.email
                .enqueue(&email)
                .await
                .map_err(|e| PolicyError::Notification(e.to_string()))?;
            report.emails = 1;
        }

        info!(in_app = report.in_app, emails = report.emails, "Insufficient balance notification sent");
        Ok(report)
    }
}

/// Renders one message of the low-balance resource
fn render(message_id: &str, args: &FluentArgs) -> Result<String, PolicyError> {
    let resource = FluentResource::try_new(INSUFFICIENT_BALANCE_FTL.to_string())
        .map_err(|_| PolicyError::Notification("notification template does not parse".to_string()))?;

    let mut bundle = FluentBundle::new(vec![langid!("en-US")]);
    bundle.set_use_isolating(false);
    bundle
        .add_resource(resource)
        .map_err(|_| PolicyError::Notification("notification template has duplicate messages".to_string()))?;

    let pattern = bundle
        .get_message(message_id)
        .and_then(|m| m.value())
        .ok_or_else(|| PolicyError::Notification(format!("missing notification message '{}'", message_id)))?;

    let mut errors = vec![];
    let text = bundle.format_pattern(pattern, Some(args), &mut errors);
    if !errors.is_empty() {
        return Err(PolicyError::Notification(format!(
            "failed to render '{}': {:?}",
            message_id, errors
        )));
    }
    Ok(text.into_owned())
}
