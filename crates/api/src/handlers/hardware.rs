//! Handlers for the `/hardware` resource: availability, checkout,
//! check-in, and administrative kind management.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use labtrack_core::hardware::{Availability, HardwareKind};
use labtrack_core::reservation::Holding;
use labtrack_core::types::Units;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for the hardware listing endpoint.
#[derive(Debug, Deserialize)]
pub struct HardwareQuery {
    /// Project scope; without it the listing spans all projects.
    pub project_id: Option<String>,
}

/// One project's hardware kinds, used by the unscoped listing.
#[derive(Debug, Serialize)]
pub struct ProjectHardware {
    pub project_id: String,
    pub kinds: Vec<Availability>,
}

/// Request body for introducing a hardware kind.
#[derive(Debug, Deserialize)]
pub struct DefineKindRequest {
    pub project_id: String,
    pub name: String,
    pub capacity: Units,
}

/// Request body for the administrative capacity update.
#[derive(Debug, Deserialize)]
pub struct UpdateCapacityRequest {
    pub project_id: String,
    pub name: String,
    pub capacity: Units,
}

/// Request body for checkout and check-in.
#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    pub identity: String,
    pub project_id: String,
    pub name: String,
    pub amount: Units,
}

/// Query parameters for the holdings endpoint.
#[derive(Debug, Deserialize)]
pub struct HoldingsQuery {
    pub identity: String,
    pub project_id: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/hardware
///
/// With `project_id`, availability snapshots for that project's kinds;
/// without it, every project's kinds for the discovery view.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<HardwareQuery>,
) -> AppResult<Response> {
    match query.project_id.as_deref() {
        Some(project_id) => {
            let kinds = state.service.list_hardware(project_id).await?;
            Ok(Json(DataResponse { data: kinds }).into_response())
        }
        None => {
            let overview: Vec<ProjectHardware> = state
                .service
                .hardware_overview()
                .await
                .into_iter()
                .map(|(project_id, kinds)| ProjectHardware { project_id, kinds })
                .collect();
            Ok(Json(DataResponse { data: overview }).into_response())
        }
    }
}

/// POST /api/v1/hardware/kinds
pub async fn define_kind(
    State(state): State<AppState>,
    Json(input): Json<DefineKindRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<HardwareKind>>)> {
    let kind = state
        .service
        .define_kind(&input.project_id, &input.name, input.capacity)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: kind })))
}

/// PUT /api/v1/hardware/kinds
pub async fn update_capacity(
    State(state): State<AppState>,
    Json(input): Json<UpdateCapacityRequest>,
) -> AppResult<Json<DataResponse<Availability>>> {
    let availability = state
        .service
        .update_capacity(&input.project_id, &input.name, input.capacity)
        .await?;
    Ok(Json(DataResponse { data: availability }))
}

/// POST /api/v1/hardware/checkout
///
/// On success the response carries the authoritative post-mutation
/// availability snapshot, so the UI never has to guess state.
pub async fn checkout(
    State(state): State<AppState>,
    Json(input): Json<ReservationRequest>,
) -> AppResult<Json<DataResponse<Availability>>> {
    let availability = state
        .service
        .checkout(&input.identity, &input.project_id, &input.name, input.amount)
        .await?;
    Ok(Json(DataResponse { data: availability }))
}

/// POST /api/v1/hardware/checkin
pub async fn checkin(
    State(state): State<AppState>,
    Json(input): Json<ReservationRequest>,
) -> AppResult<Json<DataResponse<Availability>>> {
    let availability = state
        .service
        .checkin(&input.identity, &input.project_id, &input.name, input.amount)
        .await?;
    Ok(Json(DataResponse { data: availability }))
}

/// GET /api/v1/hardware/holdings
pub async fn holdings(
    State(state): State<AppState>,
    Query(query): Query<HoldingsQuery>,
) -> AppResult<Json<DataResponse<Vec<Holding>>>> {
    let holdings = state
        .service
        .holdings(&query.identity, &query.project_id)
        .await?;
    Ok(Json(DataResponse { data: holdings }))
}
