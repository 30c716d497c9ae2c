pub mod dashboard;
pub mod directory;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod users;

pub use dashboard::{greeting, AdminDashboardService};
pub use directory::DoctorDirectoryService;
pub use models::{AdminForm, Analytics, DoctorForm};
pub use services::AdminService;
pub use users::AdminUsersService;
