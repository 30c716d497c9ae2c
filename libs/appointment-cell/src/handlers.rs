use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{json, Value};

use auth_cell::PortalContext;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;

use crate::booking::{BookingDetails, BookingService, BookingWizard, WizardState};
use crate::dashboard::{DashboardService, DoctorDashboard, PatientDashboard};
use crate::form::{AppointmentForm, FormService, FormView};
use crate::listing::{FilterUpdate, ListPermissions, ListService, ListState, ListView};
use crate::models::{NoteUpdate, PageRequest, Selection, StatusChange};
use crate::services::AppointmentService;
use crate::slip::{appointment_details, appointment_slip};

pub const LIST_PATH: &str = "/appointments";

/// Router state: the portal context plus the screens that keep state
/// between requests.
#[derive(Clone)]
pub struct AppointmentState {
    pub ctx: Arc<PortalContext>,
    pub list: Arc<ListState>,
    pub wizard: Arc<WizardState>,
}

impl AppointmentState {
    pub fn new(ctx: Arc<PortalContext>) -> Self {
        Self {
            ctx,
            list: Arc::new(ListState::new()),
            wizard: Arc::new(WizardState::new()),
        }
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Unknown appointments send the user back to the list.
fn back_to_list(err: AppError) -> Response {
    match err {
        AppError::NotFound(_) => Redirect::to(LIST_PATH).into_response(),
        other => other.into_response(),
    }
}

// ==============================================================================
// LIST
// ==============================================================================

#[axum::debug_handler]
pub async fn list_screen(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<ListView>, AppError> {
    let view = ListService::new(&state.ctx, user).load(&state.list).await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn update_filter(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(update): Json<FilterUpdate>,
) -> Result<Json<ListView>, AppError> {
    let view = ListService::new(&state.ctx, user).update_filter(&state.list, update).await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn go_to_page(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(request): Json<PageRequest>,
) -> Json<ListView> {
    Json(ListService::new(&state.ctx, user).go_to_page(&state.list, request.page))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
) -> Result<Json<ListView>, AppError> {
    let view = ListService::new(&state.ctx, user).delete(&state.list, id).await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn change_status(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<ListView>, AppError> {
    let view = ListService::new(&state.ctx, user)
        .change_status(&state.list, id, change.status)
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn save_note(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
    Json(note): Json<NoteUpdate>,
) -> Result<Json<ListView>, AppError> {
    let view = ListService::new(&state.ctx, user).save_note(&state.list, id, note).await?;
    Ok(Json(view))
}

// ==============================================================================
// DETAILS & PRINTING
// ==============================================================================

#[axum::debug_handler]
pub async fn details_screen(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
) -> Response {
    match AppointmentService::new(&state.ctx).get(id).await {
        Ok(appointment) => Json(json!({
            "appointment": appointment,
            "permissions": ListPermissions::for_role(user.role),
        }))
        .into_response(),
        Err(err) => back_to_list(err),
    }
}

#[axum::debug_handler]
pub async fn print_slip(
    State(state): State<AppointmentState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let appointment = AppointmentService::new(&state.ctx).get(id).await?;
    Ok(Html(appointment_slip(&appointment)))
}

#[axum::debug_handler]
pub async fn print_details(
    State(state): State<AppointmentState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let appointment = AppointmentService::new(&state.ctx).get(id).await?;
    Ok(Html(appointment_details(&appointment)))
}

// ==============================================================================
// FORM
// ==============================================================================

#[axum::debug_handler]
pub async fn new_form(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Json<FormView> {
    Json(FormService::new(&state.ctx, user).new_form().await)
}

#[axum::debug_handler]
pub async fn create_from_form(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(form): Json<AppointmentForm>,
) -> Result<Redirect, AppError> {
    FormService::new(&state.ctx, user).submit(None, form).await?;
    Ok(Redirect::to(LIST_PATH))
}

#[axum::debug_handler]
pub async fn edit_form(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
) -> Response {
    match FormService::new(&state.ctx, user).edit_form(id).await {
        Ok(view) => Json(view).into_response(),
        Err(err) => back_to_list(err),
    }
}

#[axum::debug_handler]
pub async fn update_from_form(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
    Json(form): Json<AppointmentForm>,
) -> Response {
    match FormService::new(&state.ctx, user).submit(Some(id), form).await {
        Ok(()) => Redirect::to(LIST_PATH).into_response(),
        Err(err) => back_to_list(err),
    }
}

// ==============================================================================
// BOOKING WIZARD
// ==============================================================================

#[axum::debug_handler]
pub async fn wizard_screen(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<BookingWizard>, AppError> {
    let wizard = BookingService::new(&state.ctx, user).open(&state.wizard).await?;
    Ok(Json(wizard))
}

#[axum::debug_handler]
pub async fn wizard_division(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(selection): Json<Selection>,
) -> Result<Json<BookingWizard>, AppError> {
    let wizard = BookingService::new(&state.ctx, user)
        .choose_division(&state.wizard, selection.id)
        .await?;
    Ok(Json(wizard))
}

#[axum::debug_handler]
pub async fn wizard_district(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(selection): Json<Selection>,
) -> Result<Json<BookingWizard>, AppError> {
    let wizard = BookingService::new(&state.ctx, user)
        .choose_district(&state.wizard, selection.id)
        .await?;
    Ok(Json(wizard))
}

#[axum::debug_handler]
pub async fn wizard_upazila(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(selection): Json<Selection>,
) -> Json<BookingWizard> {
    Json(BookingService::new(&state.ctx, user).choose_upazila(&state.wizard, selection.id))
}

#[axum::debug_handler]
pub async fn wizard_search(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<BookingWizard>, AppError> {
    let wizard = BookingService::new(&state.ctx, user).search_hospitals(&state.wizard).await?;
    Ok(Json(wizard))
}

fn required(selection: Selection, what: &str) -> Result<i64, AppError> {
    selection
        .id
        .ok_or_else(|| AppError::BadRequest(format!("A {} id is required", what)))
}

#[axum::debug_handler]
pub async fn wizard_hospital(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(selection): Json<Selection>,
) -> Result<Json<BookingWizard>, AppError> {
    let id = required(selection, "hospital")?;
    let wizard = BookingService::new(&state.ctx, user).select_hospital(&state.wizard, id).await?;
    Ok(Json(wizard))
}

#[axum::debug_handler]
pub async fn wizard_doctor(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(selection): Json<Selection>,
) -> Result<Json<BookingWizard>, AppError> {
    let id = required(selection, "doctor")?;
    let wizard = BookingService::new(&state.ctx, user).select_doctor(&state.wizard, id).await?;
    Ok(Json(wizard))
}

#[axum::debug_handler]
pub async fn wizard_details(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Json(details): Json<BookingDetails>,
) -> Result<Json<BookingWizard>, AppError> {
    let wizard = BookingService::new(&state.ctx, user).set_details(&state.wizard, details).await?;
    Ok(Json(wizard))
}

#[axum::debug_handler]
pub async fn wizard_back(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Json<BookingWizard> {
    Json(BookingService::new(&state.ctx, user).go_back(&state.wizard))
}

#[axum::debug_handler]
pub async fn wizard_change_area(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Json<BookingWizard> {
    Json(BookingService::new(&state.ctx, user).change_area(&state.wizard))
}

#[axum::debug_handler]
pub async fn wizard_submit(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Redirect, AppError> {
    BookingService::new(&state.ctx, user).submit(&state.wizard).await?;
    Ok(Redirect::to(LIST_PATH))
}

// ==============================================================================
// DASHBOARDS
// ==============================================================================

#[axum::debug_handler]
pub async fn patient_dashboard(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<Value>, AppError> {
    let welcome = user.name.clone();
    let dashboard: PatientDashboard = DashboardService::new(&state.ctx, user).patient(today()).await?;
    Ok(Json(json!({ "patient": welcome, "dashboard": dashboard })))
}

#[axum::debug_handler]
pub async fn doctor_dashboard(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<DoctorDashboard>, AppError> {
    let dashboard = DashboardService::new(&state.ctx, user).doctor(today()).await?;
    Ok(Json(dashboard))
}

#[axum::debug_handler]
pub async fn doctor_dashboard_status(
    State(state): State<AppointmentState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Result<Json<DoctorDashboard>, AppError> {
    let dashboard = DashboardService::new(&state.ctx, user)
        .change_status(id, change.status, today())
        .await?;
    Ok(Json(dashboard))
}
