pub mod booking;
pub mod dashboard;
pub mod form;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod router;
pub mod services;
pub mod slip;

pub use dashboard::{appointment_summary, AppointmentSummary, ChartSeries};
pub use models::{Appointment, AppointmentStatus};
pub use services::AppointmentService;
