//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the authenticated request context.

use crate::config::Config;
use booknotes_core::generator::{ContentGenerator, OutlineGenerator};
use booknotes_core::ports::{DatabaseService, FileStorage, GenerativeService};
use serde::Serialize;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub storage: Arc<dyn FileStorage>,
    pub config: Arc<Config>,
    pub outline_generator: OutlineGenerator,
    pub content_generator: ContentGenerator,
}

impl AppState {
    /// Wires the generators to a single model backend.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        storage: Arc<dyn FileStorage>,
        ai: Arc<dyn GenerativeService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db,
            storage,
            config,
            outline_generator: OutlineGenerator::new(ai.clone()),
            content_generator: ContentGenerator::new(ai),
        }
    }
}

//=========================================================================================
// SessionUser (Specific to One Authenticated Request)
//=========================================================================================

/// The logged-in user, resolved from the session cookie by the auth middleware
/// and handed to handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub username: String,
    pub email: String,
}
