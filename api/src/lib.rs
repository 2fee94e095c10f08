//! Atelier REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ATELIER API                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        REST API                                  │   │
//! │  │  OpenAPI | Session Tokens | Rate Limiting | CORS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │   Critique   │  │   Credits    │  │   Tickets    │  │   Admin    │  │
//! │  │  gate+bill   │  │  read model  │  │    desk      │  │ back office│  │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └─────┬──────┘  │
//! │         │                 │                 │                │         │
//! │  ┌──────▼─────────────────▼─────────────────▼────────────────▼──────┐  │
//! │  │        billing core │ store │ critique pipeline │ support        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use atelier_billing::{LedgerStore, TrialManager, UsageRecorder};
use atelier_core::{Clock, SystemClock};
use atelier_critique::{ModuleCatalog, VisionModel};
use atelier_store::{Database, MemoryStateStore, StateStore};
use atelier_support::TicketDesk;

pub use config::ApiConfig;
pub use error::ApiError;
pub use models::*;

use middleware::rate_limit::{RateLimitConfig, RateLimiter};

/// Shared API state.
#[derive(Clone)]
pub struct ApiState {
    /// The relational store.
    pub db: Arc<Database>,
    /// Ledger port used by the billing core; normally the same store,
    /// swapped for failing fakes in tests.
    pub ledger: Arc<dyn LedgerStore>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
    /// Media/style/scenario catalog.
    pub catalog: Arc<ModuleCatalog>,
    /// External vision model.
    pub model: Arc<dyn VisionModel>,
    /// Support desk.
    pub desk: Arc<TicketDesk>,
    /// Deduction transaction runner.
    pub recorder: Arc<UsageRecorder>,
    /// Trial lifecycle.
    pub trials: Arc<TrialManager>,
    /// Per-account client state.
    pub state_store: Arc<dyn StateStore>,
    /// Request rate limiter.
    pub limiter: Arc<RateLimiter>,
    /// Runtime configuration.
    pub config: Arc<ApiConfig>,
}

impl ApiState {
    /// Wire the state from a store, model client and configuration.
    pub fn new(db: Arc<Database>, model: Arc<dyn VisionModel>, config: ApiConfig) -> Self {
        Self::with_clock(db, model, config, Arc::new(SystemClock))
    }

    /// Same as [`ApiState::new`] with an injected clock (tests).
    pub fn with_clock(
        db: Arc<Database>,
        model: Arc<dyn VisionModel>,
        config: ApiConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger: Arc<dyn LedgerStore> = db.clone();
        Self {
            desk: Arc::new(TicketDesk::new(db.clone(), clock.clone())),
            recorder: Arc::new(UsageRecorder::new(ledger.clone(), clock.clone())),
            trials: Arc::new(TrialManager::new(ledger.clone(), clock.clone())),
            db,
            ledger,
            clock,
            catalog: Arc::new(ModuleCatalog::new()),
            model,
            state_store: Arc::new(MemoryStateStore::new()),
            limiter: Arc::new(RateLimiter::new(RateLimitConfig::default())),
            config: Arc::new(config),
        }
    }

    /// Swap the ledger port (tests exercise deduction failures this way).
    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerStore>) -> Self {
        self.recorder = Arc::new(UsageRecorder::new(ledger.clone(), self.clock.clone()));
        self.trials = Arc::new(TrialManager::new(ledger.clone(), self.clock.clone()));
        self.ledger = ledger;
        self
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atelier API",
        version = "1.0.0",
        description = "Atelier - structured AI critique for artwork, with usage-credit accounting",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::critique::create_critique,
        routes::credits::get_credits,
        routes::tickets::create_ticket,
        routes::tickets::list_tickets,
        routes::masters::validate_master,
    ),
    components(
        schemas(
            ErrorResponse,
            CritiqueRequest,
            CreditSummaryDto,
            TicketCreate,
            TicketDto,
            MasterValidateRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "critique", description = "Artwork critique flow"),
        (name = "credits", description = "Usage-credit read model"),
        (name = "tickets", description = "Support tickets"),
        (name = "masters", description = "Master style validation"),
        (name = "admin", description = "Back office")
    )
)]
pub struct ApiDoc;

/// Build the API router.
pub fn build_router(state: ApiState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes(state: Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/critiques", routes::critique::router())
        .nest("/me", routes::me_router())
        .nest("/tickets", routes::tickets::router())
        .nest("/masters", routes::masters::router())
        .nest("/admin", routes::admin::router())
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::rate_limit::enforce,
        ))
}
