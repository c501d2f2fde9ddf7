//! # Biblio Library API
//!
//! REST server for library circulation: catalog browsing, borrow/return,
//! loans, reservations, and administrative reports, with a WebSocket feed
//! for availability changes.
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven configuration
//! - [`error`] - API error type and HTTP status mapping
//! - [`auth`] - JWT issue/validate, password hashing, request extractor
//! - [`circulation`] - Orchestration over core decisions and the database
//! - [`notifier`] - Broadcast channel and `/ws` endpoint
//! - [`routes`] - Axum handlers and the router

pub mod auth;
pub mod circulation;
pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;

use std::sync::Arc;

use crate::auth::JwtManager;
use crate::circulation::CirculationService;
use crate::config::ApiConfig;
use crate::notifier::ChangeNotifier;
use biblio_db::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: ChangeNotifier,
    pub circulation: CirculationService,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Assembles application state from its parts.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let notifier = ChangeNotifier::new();
        let circulation = CirculationService::new(db.clone(), notifier.clone());
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
        ));

        AppState {
            db,
            notifier,
            circulation,
            jwt,
            config: Arc::new(config),
        }
    }
}
