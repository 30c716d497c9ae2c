use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;

use auth_cell::PortalContext;
use shared_models::auth::{Role, UserProfile};

pub const AVATAR_PLACEHOLDER: &str = "https://via.placeholder.com/40";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

const fn link(label: &'static str, path: &'static str) -> NavLink {
    NavLink { label, path }
}

/// Sidebar entries for `role`, profile last.
pub fn nav_links(role: Role) -> Vec<NavLink> {
    let mut links = match role {
        Role::Patient => vec![
            link("Dashboard", "/patient/dashboard"),
            link("Appointments", "/appointments"),
            link("New Appointment", "/new"),
        ],
        Role::Doctor => vec![
            link("Dashboard", "/doctor/dashboard"),
            link("Appointments", "/appointments"),
            link("My Schedule", "/schedule"),
        ],
        Role::Admin | Role::SuperAdmin => vec![
            link("Dashboard", "/admin/dashboard"),
            link("Doctors", "/admin/doctors"),
            link("Appointment List", "/admin/appointments"),
            link("Financials", "/admin/financial"),
        ],
    };
    if role == Role::SuperAdmin {
        links.push(link("Hospitals", "/admin/hospitals"));
        links.push(link("Admins & Users", "/admin/users"));
    }
    links.push(link("My Profile", "/profile"));
    links
}

#[derive(Debug, Serialize)]
pub struct ShellUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shell {
    pub user: ShellUser,
    pub links: Vec<NavLink>,
    pub toast_count: usize,
}

#[axum::debug_handler]
pub async fn shell(
    State(ctx): State<Arc<PortalContext>>,
    Extension(user): Extension<UserProfile>,
) -> Json<Shell> {
    Json(Shell {
        links: nav_links(user.role),
        toast_count: ctx.toasts.active().len(),
        user: ShellUser {
            avatar: user.avatar.unwrap_or_else(|| AVATAR_PLACEHOLDER.to_string()),
            name: user.name,
            email: user.email,
            role: user.role,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(role: Role) -> Vec<&'static str> {
        nav_links(role).into_iter().map(|l| l.label).collect()
    }

    #[test]
    fn each_role_sees_its_own_links() {
        assert_eq!(labels(Role::Patient), vec!["Dashboard", "Appointments", "New Appointment", "My Profile"]);
        assert_eq!(labels(Role::Doctor), vec!["Dashboard", "Appointments", "My Schedule", "My Profile"]);
        assert_eq!(
            labels(Role::Admin),
            vec!["Dashboard", "Doctors", "Appointment List", "Financials", "My Profile"]
        );
    }

    #[test]
    fn super_admin_gets_hospitals_and_users() {
        let links = nav_links(Role::SuperAdmin);
        assert!(links.contains(&link("Hospitals", "/admin/hospitals")));
        assert!(links.contains(&link("Admins & Users", "/admin/users")));
        assert_eq!(links.last().map(|l| l.path), Some("/profile"));
    }
}
