use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use chrono::{Local, Timelike};

use auth_cell::PortalContext;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;

use crate::dashboard::{AdminDashboard, AdminDashboardService, FinancialSummary};
use crate::directory::{DirectoryScreen, DoctorDirectoryService, DoctorEditor};
use crate::models::{AdminForm, DirectoryQuery, DoctorForm, SearchQuery, StatusToggle};
use crate::users::{AdminUsersService, UsersScreen};

pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";

// ==============================================================================
// DASHBOARD
// ==============================================================================

pub async fn admin_home() -> Redirect {
    Redirect::to(ADMIN_DASHBOARD_PATH)
}

#[axum::debug_handler]
pub async fn dashboard(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<AdminDashboard>, AppError> {
    let now = Local::now();
    let view = AdminDashboardService::new(&ctx, user)
        .load(now.date_naive(), now.hour())
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn financials(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<FinancialSummary>, AppError> {
    let today = Local::now().date_naive();
    Ok(Json(AdminDashboardService::new(&ctx, user).financials(today).await?))
}

// ==============================================================================
// DOCTOR DIRECTORY
// ==============================================================================

#[axum::debug_handler]
pub async fn doctors_screen(
    State(ctx): State<Arc<PortalContext>>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<DirectoryScreen>, AppError> {
    Ok(Json(DoctorDirectoryService::new(&ctx).screen(query).await?))
}

#[axum::debug_handler]
pub async fn new_doctor_form(State(ctx): State<Arc<PortalContext>>) -> Result<Json<DoctorEditor>, AppError> {
    Ok(Json(DoctorDirectoryService::new(&ctx).editor(None).await?))
}

#[axum::debug_handler]
pub async fn edit_doctor_form(
    State(ctx): State<Arc<PortalContext>>,
    Path(id): Path<i64>,
) -> Result<Json<DoctorEditor>, AppError> {
    Ok(Json(DoctorDirectoryService::new(&ctx).editor(Some(id)).await?))
}

#[axum::debug_handler]
pub async fn add_doctor(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<DoctorForm>,
) -> Result<StatusCode, AppError> {
    DoctorDirectoryService::new(&ctx).add(form).await?;
    Ok(StatusCode::CREATED)
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(ctx): State<Arc<PortalContext>>,
    Path(id): Path<i64>,
    Json(form): Json<DoctorForm>,
) -> Result<StatusCode, AppError> {
    DoctorDirectoryService::new(&ctx).update(id, form).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn set_doctor_status(
    State(ctx): State<Arc<PortalContext>>,
    Path(id): Path<i64>,
    Json(toggle): Json<StatusToggle>,
) -> Result<StatusCode, AppError> {
    DoctorDirectoryService::new(&ctx).set_active(id, toggle.active).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// ADMIN USERS
// ==============================================================================

#[axum::debug_handler]
pub async fn users_screen(
    State(ctx): State<Arc<PortalContext>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<UsersScreen>, AppError> {
    Ok(Json(AdminUsersService::new(&ctx).screen(query.search).await?))
}

#[axum::debug_handler]
pub async fn create_admin(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<AdminForm>,
) -> Result<StatusCode, AppError> {
    AdminUsersService::new(&ctx).create_admin(form).await?;
    Ok(StatusCode::CREATED)
}
