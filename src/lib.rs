pub mod dashboard;
pub mod images;
pub mod ledger;
pub mod model;
pub mod render;
pub mod routes;
pub mod store;

use std::sync::Arc;

use tokio::sync::watch;

/// Shared handler state. The dashboard receiver is read-only; only the
/// aggregator task writes to it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<store::LedgerStore>,
    pub ledger: Arc<ledger::Ledger>,
    pub dashboard: watch::Receiver<dashboard::DashboardSummary>,
}
