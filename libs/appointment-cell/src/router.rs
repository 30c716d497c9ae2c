use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use auth_cell::guards::{guard_middleware, RouteGuard, ADMIN_ROLES, APPOINTMENT_EDITORS, DOCTOR_ONLY, PATIENT_ONLY};
use auth_cell::PortalContext;

use crate::handlers::{self, AppointmentState};

pub fn appointment_routes(ctx: Arc<PortalContext>) -> Router {
    let state = AppointmentState::new(ctx.clone());

    let list_routes = Router::new()
        .route("/appointments", get(handlers::list_screen))
        .route("/appointments/filter", put(handlers::update_filter))
        .route("/appointments/page", put(handlers::go_to_page))
        .route("/appointments/{id}", delete(handlers::delete_appointment))
        .route("/appointments/{id}/status", patch(handlers::change_status))
        .route("/appointments/{id}/notes", put(handlers::save_note))
        .route("/appointments/{id}/slip", get(handlers::print_slip))
        .route("/view/{id}", get(handlers::details_screen))
        .route("/view/{id}/print", get(handlers::print_details))
        .layer(middleware::from_fn_with_state(
            RouteGuard::authenticated(ctx.clone()),
            guard_middleware,
        ));

    let form_routes = Router::new()
        .route("/appointments/form", get(handlers::new_form).post(handlers::create_from_form))
        .route("/edit/{id}", get(handlers::edit_form).put(handlers::update_from_form))
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx.clone(), APPOINTMENT_EDITORS),
            guard_middleware,
        ));

    let patient_routes = Router::new()
        .route("/new", get(handlers::wizard_screen))
        .route("/new/division", post(handlers::wizard_division))
        .route("/new/district", post(handlers::wizard_district))
        .route("/new/upazila", post(handlers::wizard_upazila))
        .route("/new/search", post(handlers::wizard_search))
        .route("/new/hospital", post(handlers::wizard_hospital))
        .route("/new/doctor", post(handlers::wizard_doctor))
        .route("/new/details", put(handlers::wizard_details))
        .route("/new/back", post(handlers::wizard_back))
        .route("/new/change-area", post(handlers::wizard_change_area))
        .route("/new/submit", post(handlers::wizard_submit))
        .route("/patient/dashboard", get(handlers::patient_dashboard))
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx.clone(), PATIENT_ONLY),
            guard_middleware,
        ));

    let doctor_routes = Router::new()
        .route("/doctor/dashboard", get(handlers::doctor_dashboard))
        .route(
            "/doctor/dashboard/appointments/{id}/status",
            patch(handlers::doctor_dashboard_status),
        )
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx.clone(), DOCTOR_ONLY),
            guard_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin/appointments", get(handlers::list_screen))
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx, ADMIN_ROLES),
            guard_middleware,
        ));

    Router::new()
        .merge(list_routes)
        .merge(form_routes)
        .merge(patient_routes)
        .merge(doctor_routes)
        .merge(admin_routes)
        .with_state(state)
}
