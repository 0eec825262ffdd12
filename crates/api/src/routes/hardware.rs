//! Route definitions for the `/hardware` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::hardware;
use crate::state::AppState;

/// Routes mounted at `/hardware`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(hardware::list))
        .route(
            "/kinds",
            post(hardware::define_kind).put(hardware::update_capacity),
        )
        .route("/checkout", post(hardware::checkout))
        .route("/checkin", post(hardware::checkin))
        .route("/holdings", get(hardware::holdings))
}
