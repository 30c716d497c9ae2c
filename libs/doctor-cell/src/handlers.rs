use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};

use appointment_cell::models::StatusChange;
use auth_cell::PortalContext;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;

use crate::models::{ScheduleOutcome, ScheduleRequest, ScheduleView, TimeBlock, WeeklyTemplate};
use crate::schedule::{ScheduleService, ScheduleState};

#[derive(Clone)]
pub struct DoctorState {
    pub ctx: Arc<PortalContext>,
    pub schedule: Arc<ScheduleState>,
}

impl DoctorState {
    pub fn new(ctx: Arc<PortalContext>) -> Self {
        Self {
            ctx,
            schedule: Arc::new(ScheduleState::new()),
        }
    }

    fn service(&self, user: UserProfile) -> ScheduleService {
        ScheduleService::new(&self.ctx, user)
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

#[axum::debug_handler]
pub async fn schedule_screen(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<ScheduleView>, AppError> {
    let view = state.service(user).view(&state.schedule, today()).await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn change_status(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<ScheduleView>, AppError> {
    let view = state
        .service(user)
        .change_status(&state.schedule, id, change.status, today())
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn toggle_day(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
    Path(day): Path<u32>,
) -> Result<Json<WeeklyTemplate>, AppError> {
    Ok(Json(state.service(user).toggle_day(&state.schedule, day)?))
}

#[axum::debug_handler]
pub async fn add_block(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
    Path(day): Path<u32>,
) -> Result<Json<WeeklyTemplate>, AppError> {
    Ok(Json(state.service(user).add_block(&state.schedule, day)?))
}

#[axum::debug_handler]
pub async fn update_block(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
    Path((day, index)): Path<(u32, usize)>,
    Json(block): Json<TimeBlock>,
) -> Result<Json<WeeklyTemplate>, AppError> {
    Ok(Json(state.service(user).set_block(&state.schedule, day, index, block)?))
}

#[axum::debug_handler]
pub async fn remove_block(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
    Path((day, index)): Path<(u32, usize)>,
) -> Result<Json<WeeklyTemplate>, AppError> {
    Ok(Json(state.service(user).remove_block(&state.schedule, day, index)?))
}

#[axum::debug_handler]
pub async fn generate_schedule(
    State(state): State<DoctorState>,
    Extension(user): Extension<UserProfile>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleOutcome>, AppError> {
    let outcome = state.service(user).generate(&state.schedule, request).await?;
    Ok(Json(outcome))
}
