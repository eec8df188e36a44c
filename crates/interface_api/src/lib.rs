//! HTTP API Layer
//!
//! REST surface of the rental insurance pipeline, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: quotes, payment confirmation, policy lookup, balances
//! - **Middleware**: request ids, tracing, audit logging
//! - **DTOs**: request/response bodies
//! - **Error Handling**: consistent error responses
//!
//! # Routes
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/api/v1/insurance/quotes` | finalized quote |
//! | `POST` | `/api/v1/insurance/premium/estimate` | rate-table premium |
//! | `GET`  | `/api/v1/insurance/policies/:id` | policy record |
//! | `POST` | `/api/v1/insurance/policies/:id/payment` | confirm payment |
//! | `GET`  | `/api/v1/insurance/tenants/:id/balance` | provider balance |
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, PipelinePorts};
//!
//! let app = create_router(AppState::new(ports, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderName,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_policy::{
    AdminDirectory, CredentialStore, EmailDispatcher, NotificationInbox, NotificationService,
    PaymentPorts, PaymentService, PolicyRecordRepository, PremiumCalculator, QuotePorts,
    QuoteService, RentalLedger, UnderwritingProvider,
};

use crate::config::ApiConfig;
use crate::handlers::{health, policies, quotes, tenants};
use crate::middleware::{audit_middleware, REQUEST_ID_HEADER};

/// Adapters the pipeline runs against
#[derive(Clone)]
pub struct PipelinePorts {
    pub credentials: Arc<dyn CredentialStore>,
    pub admins: Arc<dyn AdminDirectory>,
    pub provider: Arc<dyn UnderwritingProvider>,
    pub records: Arc<dyn PolicyRecordRepository>,
    pub rentals: Arc<dyn RentalLedger>,
    pub inbox: Arc<dyn NotificationInbox>,
    pub email: Arc<dyn EmailDispatcher>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<QuoteService>,
    pub payments: Arc<PaymentService>,
    pub records: Arc<dyn PolicyRecordRepository>,
    pub calculator: PremiumCalculator,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the pipeline services over the given ports
    ///
    /// Quote and payment share one token cache so a token fetched while
    /// quoting is reused at checkout.
    pub fn new(ports: PipelinePorts, config: ApiConfig) -> Self {
        let settings = config.pipeline_settings();
        let tokens = Arc::new(settings.token_cache());
        let calculator = PremiumCalculator::default();

        let notifications = Arc::new(NotificationService::new(
            ports.admins,
            ports.inbox,
            ports.email,
        ));

        let quotes = QuoteService::new(
            QuotePorts {
                credentials: ports.credentials.clone(),
                provider: ports.provider.clone(),
                records: ports.records.clone(),
                rentals: ports.rentals,
            },
            tokens.clone(),
            calculator.clone(),
        );

        let payments = PaymentService::new(
            PaymentPorts {
                credentials: ports.credentials,
                provider: ports.provider,
                records: ports.records.clone(),
            },
            tokens,
            notifications,
            calculator.clone(),
            settings,
        );

        Self {
            quotes: Arc::new(quotes),
            payments: Arc::new(payments),
            records: ports.records,
            calculator,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let quote_routes = Router::new().route("/", post(quotes::create_quote));

    let premium_routes = Router::new().route("/estimate", post(quotes::estimate_premium));

    let policy_routes = Router::new()
        .route("/:id", get(policies::get_policy))
        .route("/:id/payment", post(policies::confirm_payment));

    let tenant_routes = Router::new().route("/:id/balance", get(tenants::provider_balance));

    let api_routes = Router::new()
        .nest("/quotes", quote_routes)
        .nest("/premium", premium_routes)
        .nest("/policies", policy_routes)
        .nest("/tenants", tenant_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1/insurance", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
