// Résumé dashboard: the per-session view over stored records and the
// deletion workflows that act on it.
// Record metadata and blobs live in separate stores with no shared transaction;
// the key-value delete is the one that decides whether a record is gone.

pub mod controller;
pub mod deletion;
pub mod handlers;
pub mod loader;
pub mod registry;
pub mod selection;

// Re-export the types consumed by state and routes.
pub use controller::Dashboard;
pub use registry::DashboardRegistry;
