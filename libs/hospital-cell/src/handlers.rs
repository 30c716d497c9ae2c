use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use auth_cell::PortalContext;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;

use crate::management::{HospitalAdminService, HospitalEditor, HospitalsScreen};
use crate::models::{District, Division, Hospital, HospitalForm, Upazila};
use crate::services::LocationService;

// ==============================================================================
// HOSPITAL MANAGEMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn hospitals_screen(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<HospitalsScreen>, AppError> {
    let screen = HospitalAdminService::new(&ctx, user).screen().await?;
    Ok(Json(screen))
}

#[axum::debug_handler]
pub async fn new_hospital_form(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<HospitalEditor>, AppError> {
    let editor = HospitalAdminService::new(&ctx, user).editor(None).await?;
    Ok(Json(editor))
}

#[axum::debug_handler]
pub async fn edit_hospital_form(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
) -> Result<Json<HospitalEditor>, AppError> {
    let editor = HospitalAdminService::new(&ctx, user).editor(Some(id)).await?;
    Ok(Json(editor))
}

#[axum::debug_handler]
pub async fn create_hospital(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
    Json(mut form): Json<HospitalForm>,
) -> Result<(StatusCode, Json<Hospital>), AppError> {
    form.id = None;
    let hospital = HospitalAdminService::new(&ctx, user).save(form).await?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

#[axum::debug_handler]
pub async fn update_hospital(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
    Json(mut form): Json<HospitalForm>,
) -> Result<Json<Hospital>, AppError> {
    form.id = Some(id);
    let hospital = HospitalAdminService::new(&ctx, user).save(form).await?;
    Ok(Json(hospital))
}

#[axum::debug_handler]
pub async fn delete_hospital(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    HospitalAdminService::new(&ctx, user).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// LOCATION LOOKUPS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_divisions(State(ctx): State<Arc<PortalContext>>) -> Result<Json<Vec<Division>>, AppError> {
    Ok(Json(LocationService::new(&ctx).divisions().await?))
}

#[axum::debug_handler]
pub async fn list_districts(
    State(ctx): State<Arc<PortalContext>>,
    Path(division_id): Path<i64>,
) -> Result<Json<Vec<District>>, AppError> {
    Ok(Json(LocationService::new(&ctx).districts(division_id).await?))
}

#[axum::debug_handler]
pub async fn list_upazilas(
    State(ctx): State<Arc<PortalContext>>,
    Path(district_id): Path<i64>,
) -> Result<Json<Vec<Upazila>>, AppError> {
    Ok(Json(LocationService::new(&ctx).upazilas(district_id).await?))
}
