//! Application state shared across all request handlers.

use sqlx::SqlitePool;
use std::sync::Arc;
use tiffin_core::checkout::Coordinator;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: SqlitePool,
    /// The reconciliation coordinator driving the payment gateway.
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(db: SqlitePool, coordinator: Coordinator) -> Self {
        Self {
            db,
            coordinator: Arc::new(coordinator),
        }
    }
}
