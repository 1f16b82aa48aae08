//! Shared application state.

use crate::{config::Config, store::SessionStore};
use avi_core::catalog::Catalog;
use avi_core::scorer::ResponseScorer;
use std::sync::Arc;

/// State shared by every handler and WebSocket session.
pub struct AppState {
    pub catalog: Catalog,
    pub store: Arc<dyn SessionStore>,
    pub scorer: Arc<dyn ResponseScorer>,
    pub config: Config,
}
