//! Dashboard figures. Everything here is computed from the fetched
//! appointment list and the day treated as "today".

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::warn;

use auth_cell::PortalContext;
use notification_cell::Notifier;
use shared_models::auth::UserProfile;
use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentStatus};
use crate::services::AppointmentService;

/// Flat fee counted per completed appointment.
pub const CONSULTATION_FEE: u64 = 500;

const MONTHS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

fn count(rows: &[Appointment], status: AppointmentStatus) -> usize {
    rows.iter().filter(|apt| apt.status == status).count()
}

/// Doughnut data in the order pending, confirmed, complete, cancelled.
pub fn status_breakdown(rows: &[Appointment]) -> ChartSeries {
    let order = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Complete,
        AppointmentStatus::Cancelled,
    ];
    ChartSeries {
        labels: vec!["Pending".into(), "Confirmed".into(), "Complete".into(), "Cancelled".into()],
        data: order.iter().map(|status| count(rows, *status) as u64).collect(),
    }
}

/// Appointments per day over the week ending today, labelled `D/M`.
pub fn last_seven_days(rows: &[Appointment], today: NaiveDate) -> ChartSeries {
    let days: Vec<NaiveDate> = (0..7).rev().map(|back| today - Duration::days(back)).collect();
    ChartSeries {
        labels: days.iter().map(|d| format!("{}/{}", d.day(), d.month())).collect(),
        data: days
            .iter()
            .map(|day| rows.iter().filter(|apt| apt.appointment_date == *day).count() as u64)
            .collect(),
    }
}

/// Consultation fees of completed appointments per month of today's year.
pub fn monthly_earnings(rows: &[Appointment], today: NaiveDate) -> ChartSeries {
    let mut months = [0u64; 12];
    for apt in rows
        .iter()
        .filter(|apt| apt.status == AppointmentStatus::Complete && apt.appointment_date.year() == today.year())
    {
        months[apt.appointment_date.month0() as usize] += CONSULTATION_FEE;
    }
    ChartSeries {
        labels: MONTHS.iter().map(|m| m.to_string()).collect(),
        data: months.to_vec(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDashboard {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub upcoming_count: usize,
    pub upcoming: Vec<Appointment>,
    pub recent: Vec<Appointment>,
    pub status_chart: ChartSeries,
}

pub fn patient_dashboard(all: &[Appointment], user: &UserProfile, today: NaiveDate) -> PatientDashboard {
    let mine: Vec<Appointment> = all.iter().filter(|apt| apt.patient_email == user.email).cloned().collect();

    let mut upcoming: Vec<Appointment> = mine
        .iter()
        .filter(|apt| {
            apt.appointment_date >= today
                && !matches!(apt.status, AppointmentStatus::Cancelled | AppointmentStatus::Complete)
        })
        .cloned()
        .collect();
    upcoming.sort_by_key(|apt| apt.appointment_date);
    upcoming.truncate(5);

    let mut recent = mine.clone();
    recent.sort_by(|a, b| b.appointment_date.cmp(&a.appointment_date));
    recent.truncate(5);

    PatientDashboard {
        total: mine.len(),
        pending: count(&mine, AppointmentStatus::Pending),
        completed: count(&mine, AppointmentStatus::Complete),
        cancelled: count(&mine, AppointmentStatus::Cancelled),
        upcoming_count: upcoming.len(),
        upcoming,
        recent,
        status_chart: status_breakdown(&mine),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboard {
    pub total: usize,
    pub today: Vec<Appointment>,
    pub todays_count: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub this_week: usize,
    pub avg_daily_patients: u64,
    pub total_patients: usize,
    pub total_earnings: u64,
    pub monthly_earnings: u64,
    pub daily_chart: ChartSeries,
    pub status_chart: ChartSeries,
    pub earnings_chart: ChartSeries,
}

pub fn doctor_dashboard(all: &[Appointment], user: &UserProfile, today: NaiveDate) -> DoctorDashboard {
    let mine: Vec<Appointment> = match user.doctor_key() {
        Some(key) => all.iter().filter(|apt| apt.doctor_id == key).cloned().collect(),
        None => all.to_vec(),
    };

    let todays: Vec<Appointment> = mine.iter().filter(|apt| apt.appointment_date == today).cloned().collect();
    let since = |days: i64| {
        let from = today - Duration::days(days);
        mine.iter().filter(|apt| apt.appointment_date >= from).count()
    };
    let patients: HashSet<&str> = mine.iter().map(|apt| apt.patient_email.as_str()).collect();
    let earnings_chart = monthly_earnings(&mine, today);

    DoctorDashboard {
        total: mine.len(),
        todays_count: todays.len(),
        today: todays,
        pending: count(&mine, AppointmentStatus::Pending),
        confirmed: count(&mine, AppointmentStatus::Confirmed),
        completed: count(&mine, AppointmentStatus::Complete),
        cancelled: count(&mine, AppointmentStatus::Cancelled),
        this_week: since(7),
        avg_daily_patients: (since(30) as f64 / 30.0).round() as u64,
        total_patients: patients.len(),
        total_earnings: earnings_chart.data.iter().sum(),
        monthly_earnings: earnings_chart.data[today.month0() as usize],
        daily_chart: last_seven_days(&mine, today),
        status_chart: status_breakdown(&mine),
        earnings_chart,
    }
}

/// Appointment side of the admin dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub total: usize,
    pub todays_count: usize,
    pub pending: usize,
    pub today: Vec<Appointment>,
    pub daily_chart: ChartSeries,
    pub status_chart: ChartSeries,
    pub earnings_chart: ChartSeries,
}

pub fn appointment_summary(all: &[Appointment], today: NaiveDate) -> AppointmentSummary {
    let todays: Vec<Appointment> = all.iter().filter(|apt| apt.appointment_date == today).cloned().collect();
    AppointmentSummary {
        total: all.len(),
        todays_count: todays.len(),
        pending: count(all, AppointmentStatus::Pending),
        today: todays,
        daily_chart: last_seven_days(all, today),
        status_chart: status_breakdown(all),
        earnings_chart: monthly_earnings(all, today),
    }
}

pub struct DashboardService {
    appointments: AppointmentService,
    notifier: Arc<dyn Notifier>,
    user: UserProfile,
}

impl DashboardService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            appointments: AppointmentService::new(ctx),
            notifier: ctx.notifier(),
            user,
        }
    }

    async fn fetch(&self) -> Result<Vec<Appointment>, AppError> {
        self.appointments.list().await.map_err(|e| {
            warn!("Dashboard data unavailable for {}: {}", self.user.email, e);
            self.notifier.error("Failed to load appointments");
            e
        })
    }

    pub async fn patient(&self, today: NaiveDate) -> Result<PatientDashboard, AppError> {
        Ok(patient_dashboard(&self.fetch().await?, &self.user, today))
    }

    pub async fn doctor(&self, today: NaiveDate) -> Result<DoctorDashboard, AppError> {
        Ok(doctor_dashboard(&self.fetch().await?, &self.user, today))
    }

    pub async fn summary(&self, today: NaiveDate) -> Result<AppointmentSummary, AppError> {
        Ok(appointment_summary(&self.fetch().await?, today))
    }

    /// Status buttons on the doctor dashboard, followed by a reload.
    pub async fn change_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        today: NaiveDate,
    ) -> Result<DoctorDashboard, AppError> {
        self.appointments.update_status(id, status).await.map_err(|e| {
            self.notifier.error("Failed to update status");
            e
        })?;
        self.notifier.success(&format!("Appointment {}", status));
        self.doctor(today).await
    }
}
