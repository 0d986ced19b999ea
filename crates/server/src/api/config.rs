use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::schemas::LimitsResponse;

/// `GET /api/config` -- returns the limits the server enforces on shares.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Content",
    summary = "Content limits",
    description = "Returns the TTL, size and type limits applied to shared content.",
    responses(
        (status = 200, description = "Active limits", body = LimitsResponse)
    )
)]
#[allow(clippy::unused_async)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LimitsResponse::from(state.relay.limits())),
    )
}
