use std::sync::Arc;

use labtrack_ledger::ReservationService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). The event bus
/// is not carried here: handlers publish through the service, which owns
/// its own handle.
#[derive(Clone)]
pub struct AppState {
    /// The reservation core; the only writer of domain state.
    pub service: Arc<ReservationService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
