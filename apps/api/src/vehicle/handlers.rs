//! Axum route handlers for the vehicle lookups and form sessions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::vehicle::form::{self, FormEvent, FormView, SharedForm};
use crate::vehicle::lookup::CommonColors;
use crate::vehicle::models::{Condition, DescriptionMode, GeneratedDescription, VehicleRecord};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct MakeYearQuery {
    pub make: String,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub vehicle: VehicleRecord,
    pub miles: i64,
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(default)]
    pub additional_details: String,
    #[serde(default)]
    pub mode: DescriptionMode,
}

fn default_condition() -> String {
    Condition::default().as_str().to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSessionResponse {
    pub id: Uuid,
    pub form: FormView,
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless lookups
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/makes?year=
pub async fn handle_list_makes(
    State(state): State<AppState>,
    Query(params): Query<YearQuery>,
) -> Result<Json<OptionsResponse>, AppError> {
    let options = state.lookup.list_makes_for_year(params.year).await?;
    Ok(Json(OptionsResponse { options }))
}

/// GET /api/v1/models?make=&year=
pub async fn handle_list_models(
    State(state): State<AppState>,
    Query(params): Query<MakeYearQuery>,
) -> Result<Json<OptionsResponse>, AppError> {
    let options = state
        .lookup
        .list_models_for_make_year(&params.make, params.year)
        .await?;
    Ok(Json(OptionsResponse { options }))
}

/// GET /api/v1/vin/:vin
pub async fn handle_decode_vin(
    State(state): State<AppState>,
    Path(vin): Path<String>,
) -> Result<Json<VehicleRecord>, AppError> {
    Ok(Json(state.lookup.decode_vin(&vin).await?))
}

/// GET /api/v1/colors
pub async fn handle_common_colors(State(state): State<AppState>) -> Json<CommonColors> {
    Json(state.lookup.common_colors())
}

/// POST /api/v1/descriptions
///
/// One-shot generation for callers that already hold a complete vehicle record.
pub async fn handle_generate_description(
    State(state): State<AppState>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<GeneratedDescription>, AppError> {
    let text = state
        .lookup
        .generate_description(
            &request.vehicle,
            request.miles,
            &request.condition,
            &request.additional_details,
            request.mode,
        )
        .await?;
    Ok(Json(GeneratedDescription {
        text,
        mode: request.mode,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Form sessions
// ────────────────────────────────────────────────────────────────────────────

async fn find_form(state: &AppState, id: Uuid) -> Result<SharedForm, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Form {id} not found")))
}

/// POST /api/v1/forms
pub async fn handle_create_form(
    State(state): State<AppState>,
) -> (StatusCode, Json<FormSessionResponse>) {
    let (id, form) = state.sessions.create().await;
    info!("Created form session {id}");
    let view = form.lock().await.snapshot();
    (StatusCode::CREATED, Json(FormSessionResponse { id, form: view }))
}

/// GET /api/v1/forms/:id
pub async fn handle_get_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, AppError> {
    let form = find_form(&state, id).await?;
    let view = form.lock().await.snapshot();
    Ok(Json(view))
}

/// POST /api/v1/forms/:id/events
///
/// Applies a field edit and waits for any dependent option lookups it triggered.
pub async fn handle_form_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<FormEvent>,
) -> Result<Json<FormView>, AppError> {
    let form = find_form(&state, id).await?;
    let view = form::dispatch_event(&form, &state.lookup, event).await?;
    Ok(Json(view))
}

/// POST /api/v1/forms/:id/submit
///
/// Lookup and generation failures are reported in `submitError`, not as an HTTP error.
pub async fn handle_submit_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, AppError> {
    let form = find_form(&state, id).await?;
    let view = form::submit(&form, &state.lookup).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/forms/:id
pub async fn handle_delete_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Form {id} not found")));
    }
    info!("Deleted form session {id}");
    Ok(StatusCode::NO_CONTENT)
}
