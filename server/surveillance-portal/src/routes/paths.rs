//! Route path constants
//!
//! Used for runtime route definitions and for naming placeholder pages. The
//! guard's default rules refer to the same paths.

/// Health check endpoints
pub mod health {
    pub const HEALTH: &str = "/health";
    pub const STATUS: &str = "/status";
}

/// Login, logout and the denial page
pub mod auth {
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";
    pub const UNAUTHORIZED: &str = "/unauthorized";
}

/// JSON endpoints for the browser
pub mod api {
    pub const SESSION: &str = "/api/session";
    pub const CHANGE_PASSWORD: &str = "/api/account/password";
}

/// Application pages
pub mod pages {
    pub const HOME: &str = "/";
    pub const DASHBOARD: &str = "/dashboard";
    pub const PATIENTS: &str = "/patients";
    pub const VISITS: &str = "/visits";
    pub const POPULATIONS: &str = "/populations";
    pub const REPORTS: &str = "/reports";
    pub const REPORTS_EXPORT: &str = "/reports/export";
    pub const ADMIN: &str = "/admin";
    pub const ADMIN_HOSPITALS: &str = "/admin/hospitals";
    pub const ADMIN_DISEASES: &str = "/admin/diseases";
    pub const ADMIN_USERS: &str = "/admin/users";
    pub const ADMIN_SUPERADMINS: &str = "/admin/users/superadmins";
    pub const ADMIN_ADMINS: &str = "/admin/users/admins";
    pub const HOSPITAL: &str = "/hospitals/:code";

    /// Page title for a placeholder page path
    pub fn title(path: &str) -> &'static str {
        match path {
            DASHBOARD => "Dashboard",
            PATIENTS => "Patients",
            VISITS => "Visits",
            POPULATIONS => "Populations",
            REPORTS => "Reports",
            REPORTS_EXPORT => "Report export",
            ADMIN => "Administration",
            ADMIN_HOSPITALS => "Hospital administration",
            ADMIN_DISEASES => "Disease catalogue",
            ADMIN_USERS => "User administration",
            ADMIN_SUPERADMINS => "Superadmin accounts",
            ADMIN_ADMINS => "Admin accounts",
            _ => "Page",
        }
    }
}
