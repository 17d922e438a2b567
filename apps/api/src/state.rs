//! Shared application state.

use sante_db::Database;

/// State handed to every handler by axum.
///
/// `Database` clones share one pool, so cloning the state per request is
/// cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
