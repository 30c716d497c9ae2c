pub mod generator;
pub mod handlers;
pub mod models;
pub mod router;
pub mod schedule;
pub mod services;

pub use generator::{generate_slots, ScheduleError};
pub use models::{ScheduleRequest, TimeBlock, WeeklyTemplate};
pub use services::DoctorService;
