pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Toast, ToastKind};
pub use services::toast::{Notifier, ToastService};
