pub mod hardware;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                      list (GET, ?member=), create (POST)
/// /projects/join                 join (POST)
/// /projects/{id}                 get (GET)
///
/// /hardware                      availability listing (GET, ?project_id=)
/// /hardware/kinds                define kind (POST), update capacity (PUT)
/// /hardware/checkout             checkout (POST)
/// /hardware/checkin              check-in (POST)
/// /hardware/holdings             caller's holdings (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/hardware", hardware::router())
}
