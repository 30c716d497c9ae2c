//! Doctor schedule screen: calendar of appointments plus the weekly template
//! used to publish slots.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use appointment_cell::{AppointmentService, AppointmentStatus};
use auth_cell::PortalContext;
use notification_cell::Notifier;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;

use crate::generator::generate_slots;
use crate::models::{CalendarEvent, ScheduleOutcome, ScheduleRequest, ScheduleView, TimeBlock, WeeklyTemplate};

#[derive(Debug, Default)]
struct TemplateScreen {
    owner: Option<String>,
    template: WeeklyTemplate,
}

/// Template edits kept between requests; reset when another doctor signs in.
#[derive(Debug, Default)]
pub struct ScheduleState {
    screen: Mutex<TemplateScreen>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, email: &str, f: impl FnOnce(&mut WeeklyTemplate) -> R) -> R {
        let mut screen = self.screen.lock().unwrap_or_else(PoisonError::into_inner);
        if screen.owner.as_deref() != Some(email) {
            *screen = TemplateScreen {
                owner: Some(email.to_string()),
                template: WeeklyTemplate::default(),
            };
        }
        f(&mut screen.template)
    }
}

pub struct ScheduleService {
    appointments: AppointmentService,
    notifier: Arc<dyn Notifier>,
    user: UserProfile,
}

impl ScheduleService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            appointments: AppointmentService::new(ctx),
            notifier: ctx.notifier(),
            user,
        }
    }

    fn template(&self, state: &ScheduleState) -> WeeklyTemplate {
        state.with(&self.user.email, |t| t.clone())
    }

    pub async fn view(&self, state: &ScheduleState, today: NaiveDate) -> Result<ScheduleView, AppError> {
        let appointments = self.appointments.list().await.map_err(|e| {
            warn!("Failed to load appointments for {}: {}", self.user.email, e);
            e
        })?;

        Ok(ScheduleView {
            events: appointments.iter().map(CalendarEvent::from).collect(),
            today: appointments
                .iter()
                .filter(|apt| apt.appointment_date == today)
                .cloned()
                .collect(),
            template: self.template(state),
        })
    }

    pub async fn change_status(
        &self,
        state: &ScheduleState,
        id: i64,
        status: AppointmentStatus,
        today: NaiveDate,
    ) -> Result<ScheduleView, AppError> {
        self.appointments.update_status(id, status).await.map_err(|e| {
            warn!("Status change on appointment {} failed: {}", id, e);
            self.notifier.error("Something went wrong! Please try again.");
            e
        })?;

        self.notifier.success(&format!("Appointment marked as {}", status));
        self.view(state, today).await
    }

    // ==============================================================================
    // TEMPLATE EDITING
    // ==============================================================================

    pub fn toggle_day(&self, state: &ScheduleState, day: u32) -> Result<WeeklyTemplate, AppError> {
        state.with(&self.user.email, |t| {
            t.toggle(day)?;
            Ok(t.clone())
        })
    }

    pub fn add_block(&self, state: &ScheduleState, day: u32) -> Result<WeeklyTemplate, AppError> {
        state.with(&self.user.email, |t| {
            t.add_block(day)?;
            Ok(t.clone())
        })
    }

    pub fn set_block(
        &self,
        state: &ScheduleState,
        day: u32,
        index: usize,
        block: TimeBlock,
    ) -> Result<WeeklyTemplate, AppError> {
        state.with(&self.user.email, |t| {
            t.set_block(day, index, block)?;
            Ok(t.clone())
        })
    }

    pub fn remove_block(&self, state: &ScheduleState, day: u32, index: usize) -> Result<WeeklyTemplate, AppError> {
        state.with(&self.user.email, |t| {
            t.remove_block(day, index)?;
            Ok(t.clone())
        })
    }

    // ==============================================================================
    // GENERATION
    // ==============================================================================

    /// Generates slots from the current template and submits them as one batch.
    pub async fn generate(&self, state: &ScheduleState, request: ScheduleRequest) -> Result<ScheduleOutcome, AppError> {
        let doctor_id = self
            .user
            .doctor_key()
            .ok_or_else(|| self.notifier.fail(AppError::Forbidden("No doctor profile on this account".to_string())))?;

        let template = self.template(state);
        let slots = generate_slots(&template, &request, doctor_id).map_err(|e| self.notifier.fail(e.into()))?;

        if slots.is_empty() {
            debug!("Template produced no slots for doctor {}", doctor_id);
            self.notifier.info("No slots generated based on your selection.");
            return Ok(ScheduleOutcome { created: 0 });
        }

        self.appointments.create_doctor_slots(&slots).await.map_err(|e| {
            warn!("Slot batch for doctor {} rejected: {}", doctor_id, e);
            self.notifier.error("Failed to save schedule.");
            e
        })?;

        info!("Published {} slots for doctor {}", slots.len(), doctor_id);
        self.notifier.success("Schedule created successfully!");
        Ok(ScheduleOutcome { created: slots.len() })
    }
}
