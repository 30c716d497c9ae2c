use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use appointment_cell::dashboard::{monthly_earnings, DashboardService, CONSULTATION_FEE};
use appointment_cell::{AppointmentService, AppointmentStatus, AppointmentSummary, ChartSeries};
use auth_cell::PortalContext;
use notification_cell::Notifier;
use shared_models::auth::{Role, UserProfile};
use shared_models::error::AppError;

use crate::models::AnalyticsCharts;
use crate::services::AdminService;

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good Morning",
        12..=17 => "Good Afternoon",
        _ => "Good Evening",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub greeting: &'static str,
    pub user_name: String,
    pub stats: Value,
    pub appointments: AppointmentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsCharts>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub consultation_fee: u64,
    pub completed: usize,
    pub total_earnings: u64,
    pub current_month: u64,
    pub earnings_chart: ChartSeries,
}

pub fn financial_summary(rows: &[appointment_cell::Appointment], today: NaiveDate) -> FinancialSummary {
    let earnings_chart = monthly_earnings(rows, today);
    FinancialSummary {
        consultation_fee: CONSULTATION_FEE,
        completed: rows
            .iter()
            .filter(|apt| apt.status == AppointmentStatus::Complete && apt.appointment_date.year() == today.year())
            .count(),
        total_earnings: earnings_chart.data.iter().sum(),
        current_month: earnings_chart.data[today.month0() as usize],
        earnings_chart,
    }
}

pub struct AdminDashboardService {
    admin: AdminService,
    appointments: AppointmentService,
    summary: DashboardService,
    notifier: Arc<dyn Notifier>,
    user: UserProfile,
}

impl AdminDashboardService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            admin: AdminService::new(ctx),
            appointments: AppointmentService::new(ctx),
            summary: DashboardService::new(ctx, user.clone()),
            notifier: ctx.notifier(),
            user,
        }
    }

    async fn analytics(&self) -> Option<AnalyticsCharts> {
        if self.user.role != Role::SuperAdmin {
            return None;
        }
        match self.admin.analytics().await {
            Ok(analytics) => Some(AnalyticsCharts::from(&analytics)),
            Err(e) => {
                warn!("Analytics unavailable: {}", e);
                None
            }
        }
    }

    /// Stats, appointments and analytics load together; only the
    /// appointment list is required.
    pub async fn load(&self, today: NaiveDate, hour: u32) -> Result<AdminDashboard, AppError> {
        let (stats, appointments, analytics) =
            futures::join!(self.admin.stats(), self.summary.summary(today), self.analytics());

        let stats = stats.unwrap_or_else(|e| {
            warn!("System stats unavailable: {}", e);
            json!({})
        });

        Ok(AdminDashboard {
            greeting: greeting(hour),
            user_name: self.user.name.clone(),
            stats,
            appointments: appointments?,
            analytics,
        })
    }

    pub async fn financials(&self, today: NaiveDate) -> Result<FinancialSummary, AppError> {
        let rows = self.appointments.list().await.map_err(|e| {
            warn!("Financials unavailable for {}: {}", self.user.email, e);
            self.notifier.error("Failed to load appointments");
            e
        })?;
        Ok(financial_summary(&rows, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_follows_the_clock() {
        assert_eq!(greeting(0), "Good Morning");
        assert_eq!(greeting(11), "Good Morning");
        assert_eq!(greeting(12), "Good Afternoon");
        assert_eq!(greeting(17), "Good Afternoon");
        assert_eq!(greeting(18), "Good Evening");
        assert_eq!(greeting(23), "Good Evening");
    }
}
