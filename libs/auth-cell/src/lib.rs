pub mod context;
pub mod guards;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod session;

pub use context::PortalContext;
pub use guards::{evaluate, landing_path, GuardDecision, RouteAccess, RouteGuard};
pub use session::{Session, SessionStore};
