//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
///
/// The repository handle is the only value shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }
}
