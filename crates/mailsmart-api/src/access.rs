//! Panel access policy.
//!
//! Two panels share one host: the user panel rooted at `/` and the admin panel
//! under `/admin`. Every decision here is a pure function of the request path
//! and the caller's role (or lack of one).

use mailsmart_types::models::Role;

pub const USER_LOGIN: &str = "/login";
pub const ADMIN_LOGIN: &str = "/admin/login";

const PUBLIC_PATHS: &[&str] = &[USER_LOGIN, ADMIN_LOGIN, "/logout", "/health"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Proceed,
    Redirect(&'static str),
}

/// `/admin` itself or anything below it. `/administrator` is not admin.
pub fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

pub fn decide(path: &str, identity: Option<Role>) -> Access {
    if is_public_path(path) {
        return Access::Proceed;
    }

    match identity {
        None if is_admin_path(path) => Access::Redirect(ADMIN_LOGIN),
        None => Access::Redirect(USER_LOGIN),
        Some(Role::Admin) if path == "/" => Access::Redirect(Role::Admin.dashboard_path()),
        Some(Role::User) if is_admin_path(path) => Access::Redirect(Role::User.dashboard_path()),
        Some(_) => Access::Proceed,
    }
}

/// Messages are visible and editable by their owner and by any admin.
pub fn can_edit_message(role: Role, user_id: i64, owner_id: i64) -> bool {
    role.is_admin() || user_id == owner_id
}
