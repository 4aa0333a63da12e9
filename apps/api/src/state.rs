use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::DashboardRegistry;
use crate::session::SessionProvider;
use crate::storage::{FileStore, KvStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Record blobs (preview images, uploaded résumés).
    pub files: Arc<dyn FileStore>,
    pub sessions: Arc<dyn SessionProvider>,
    pub dashboards: DashboardRegistry,
}

impl AppState {
    pub fn new(
        config: Config,
        kv: Arc<dyn KvStore>,
        files: Arc<dyn FileStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        // Record metadata is only reached through the dashboards.
        let dashboards = DashboardRegistry::new(kv, files.clone());
        Self {
            config,
            files,
            sessions,
            dashboards,
        }
    }
}
