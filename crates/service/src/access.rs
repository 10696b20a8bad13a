//! Role-gated routes.

use std::str::FromStr;

use crate::auth::Role;
use crate::user::AccountData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Articles,
    Jobs,
    Dashboard,
    Profile,
    Write,
}

const ALL_ROLES: &[Role] = &[Role::Admin, Role::Writer, Role::Reader];
const AUTHORS: &[Role] = &[Role::Admin, Role::Writer];

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Articles => "/articles",
            Route::Jobs => "/jobs",
            Route::Dashboard => "/dashboard",
            Route::Profile => "/profile",
            Route::Write => "/write",
        }
    }

    /// Parse a path; a trailing slash or a query string is ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/articles" => Route::Articles,
            "/jobs" => Route::Jobs,
            "/dashboard" => Route::Dashboard,
            "/profile" => Route::Profile,
            "/write" => Route::Write,
            _ => return None,
        };
        Some(route)
    }

    /// `None` for public routes, otherwise the roles admitted.
    pub fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Route::Home | Route::Login | Route::Register | Route::Articles | Route::Jobs => None,
            Route::Dashboard | Route::Profile => Some(ALL_ROLES),
            Route::Write => Some(AUTHORS),
        }
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::from_path(s).ok_or_else(|| format!("unknown route: {s}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
    RedirectToUnauthorized,
}

/// Decide access for the signed-in account (if any). The role comes from the
/// account data, so writer grants made through account settings apply.
pub fn authorize(route: Route, account: Option<&AccountData>) -> Access {
    let Some(allowed) = route.allowed_roles() else { return Access::Granted };
    match account {
        None => Access::RedirectToLogin,
        Some(a) if allowed.contains(&a.role) => Access::Granted,
        Some(_) => Access::RedirectToUnauthorized,
    }
}
