use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::dashboard::Dashboard;
use crate::errors::AppError;
use crate::session::SessionToken;
use crate::storage::{FileStore, KvStore};

type SharedDashboard = Arc<AsyncMutex<Dashboard>>;

/// One dashboard per session, created on first access.
///
/// Mutating routes go through [`DashboardRegistry::claim`], which refuses to
/// start while another workflow holds the same dashboard.
#[derive(Clone)]
pub struct DashboardRegistry {
    kv: Arc<dyn KvStore>,
    files: Arc<dyn FileStore>,
    dashboards: Arc<Mutex<HashMap<SessionToken, SharedDashboard>>>,
}

impl DashboardRegistry {
    pub fn new(kv: Arc<dyn KvStore>, files: Arc<dyn FileStore>) -> Self {
        Self {
            kv,
            files,
            dashboards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn dashboard(&self, session: &SessionToken) -> SharedDashboard {
        let mut dashboards = self
            .dashboards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        dashboards
            .entry(session.clone())
            .or_insert_with(|| {
                Arc::new(AsyncMutex::new(Dashboard::new(
                    self.kv.clone(),
                    self.files.clone(),
                )))
            })
            .clone()
    }

    /// Waits for the dashboard; for reads.
    pub async fn wait(&self, session: &SessionToken) -> OwnedMutexGuard<Dashboard> {
        self.dashboard(session).lock_owned().await
    }

    /// Takes the dashboard for a mutation, or fails fast with `Conflict`.
    pub fn claim(&self, session: &SessionToken) -> Result<OwnedMutexGuard<Dashboard>, AppError> {
        self.dashboard(session).try_lock_owned().map_err(|_| {
            AppError::Conflict("Another operation on this dashboard is in progress".to_string())
        })
    }
}
