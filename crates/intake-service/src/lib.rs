//! Denuncia Intake Service
//!
//! Receives complaints from the "Centro de Denuncias" form and stores them,
//! with their evidence files, in blob storage.
//!
//! ## Endpoints
//!
//! - `POST /api/submit-denuncia` - Store a denuncia (`multipart/form-data`
//!   with a `data` JSON part and `archivos` file parts, or plain JSON)
//! - `POST /api/SubmitDenuncia` - Same, legacy path
//! - `GET /health` - Health check

pub mod azure;
pub mod config;
pub mod handlers;
pub mod intake;
pub mod storage;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use handlers::AppState;
pub use intake::{Intake, IntakeReceipt, UploadedFile};
pub use storage::{MemoryStore, ObjectStore};

/// Upload size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest single attachment accepted
    pub max_attachment_bytes: usize,

    /// Largest request body accepted
    pub max_request_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_attachment_bytes: 10 * 1024 * 1024,
            max_request_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.limits.max_request_bytes;
    let state = Arc::new(state);

    let intake = get(handlers::method_not_allowed_handler).post(handlers::submit_denuncia_handler);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/submit-denuncia", intake.clone())
        .route("/api/SubmitDenuncia", intake)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
