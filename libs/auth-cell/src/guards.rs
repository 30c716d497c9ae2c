//! Navigation guards.
//!
//! These checks decide which screens a session may open. They shape the
//! user experience only; the clinic API enforces the real authorization.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use shared_models::auth::Role;

use crate::context::PortalContext;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";
/// Where authenticated users land when a screen is not meant for their role.
pub const DEFAULT_AUTHENTICATED_PATH: &str = "/appointments";

pub const PATIENT_ONLY: &[Role] = &[Role::Patient];
pub const DOCTOR_ONLY: &[Role] = &[Role::Doctor];
pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];
pub const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];
pub const APPOINTMENT_EDITORS: &[Role] = &[Role::Admin, Role::Patient, Role::Doctor];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Login and registration: a logged-in visitor is sent home instead.
    GuestOnly,
    Authenticated,
    Roles(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Pure guard decision for a route given the current session's role.
pub fn evaluate(access: RouteAccess, role: Option<Role>) -> GuardDecision {
    match (access, role) {
        (RouteAccess::Public, _) => GuardDecision::Allow,
        (RouteAccess::GuestOnly, None) => GuardDecision::Allow,
        (RouteAccess::GuestOnly, Some(_)) => GuardDecision::Redirect(HOME_PATH),
        (RouteAccess::Authenticated, None) | (RouteAccess::Roles(_), None) => {
            GuardDecision::Redirect(LOGIN_PATH)
        }
        (RouteAccess::Authenticated, Some(_)) => GuardDecision::Allow,
        (RouteAccess::Roles(allowed), Some(role)) if allowed.contains(&role) => GuardDecision::Allow,
        (RouteAccess::Roles(_), Some(_)) => GuardDecision::Redirect(DEFAULT_AUTHENTICATED_PATH),
    }
}

/// Target of the `/` redirect.
pub fn landing_path(role: Option<Role>) -> &'static str {
    match role {
        None => LOGIN_PATH,
        Some(Role::Admin) | Some(Role::SuperAdmin) => "/admin/dashboard",
        Some(Role::Doctor) => "/doctor/dashboard",
        Some(Role::Patient) => "/patient/dashboard",
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    ctx: Arc<PortalContext>,
    access: RouteAccess,
}

impl RouteGuard {
    pub fn new(ctx: Arc<PortalContext>, access: RouteAccess) -> Self {
        Self { ctx, access }
    }

    pub fn authenticated(ctx: Arc<PortalContext>) -> Self {
        Self::new(ctx, RouteAccess::Authenticated)
    }

    pub fn roles(ctx: Arc<PortalContext>, roles: &'static [Role]) -> Self {
        Self::new(ctx, RouteAccess::Roles(roles))
    }

    pub fn guest_only(ctx: Arc<PortalContext>) -> Self {
        Self::new(ctx, RouteAccess::GuestOnly)
    }
}

/// Runs before the screen's handler. On success the current profile is put
/// into request extensions for `Extension<UserProfile>` extractors.
pub async fn guard_middleware(
    State(guard): State<RouteGuard>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = guard.ctx.session.current().map(|s| s.user);
    let role = user.as_ref().map(|u| u.role);

    match evaluate(guard.access, role) {
        GuardDecision::Allow => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        GuardDecision::Redirect(target) => {
            match role {
                Some(role) => warn!("{} may not open {}, redirecting to {}", role, request.uri().path(), target),
                None => debug!("No session for {}, redirecting to {}", request.uri().path(), target),
            }
            Redirect::to(target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_guard_admits_iff_role_listed() {
        let routes: [&'static [Role]; 5] = [PATIENT_ONLY, DOCTOR_ONLY, ADMIN_ROLES, SUPER_ADMIN_ONLY, APPOINTMENT_EDITORS];
        for allowed in routes {
            for role in Role::ALL {
                let decision = evaluate(RouteAccess::Roles(allowed), Some(role));
                if allowed.contains(&role) {
                    assert_eq!(decision, GuardDecision::Allow, "{} on {:?}", role, allowed);
                } else {
                    assert_eq!(decision, GuardDecision::Redirect(DEFAULT_AUTHENTICATED_PATH));
                }
            }
            assert_eq!(evaluate(RouteAccess::Roles(allowed), None), GuardDecision::Redirect(LOGIN_PATH));
        }
    }

    #[test]
    fn guest_only_sends_sessions_home() {
        assert_eq!(evaluate(RouteAccess::GuestOnly, None), GuardDecision::Allow);
        assert_eq!(evaluate(RouteAccess::GuestOnly, Some(Role::Doctor)), GuardDecision::Redirect(HOME_PATH));
    }

    #[test]
    fn landing_by_role() {
        assert_eq!(landing_path(None), "/login");
        assert_eq!(landing_path(Some(Role::SuperAdmin)), "/admin/dashboard");
        assert_eq!(landing_path(Some(Role::Admin)), "/admin/dashboard");
        assert_eq!(landing_path(Some(Role::Doctor)), "/doctor/dashboard");
        assert_eq!(landing_path(Some(Role::Patient)), "/patient/dashboard");
    }
}
