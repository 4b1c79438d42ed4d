use crate::error::PolicyError;
use auth_identity::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Everything a role may be granted. Closed: a capability that is not listed
/// here cannot be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Monotonic
    ViewDashboard,
    /// Monotonic
    ViewReports,
    /// Not monotonic: staff record visits, admins do not
    RecordVisits,
    /// Not monotonic: staff maintain population figures, admins do not
    ManagePopulations,
    /// Monotonic, superadmin only
    ManageHospitals,
    /// Monotonic, superadmin only
    ManageDiseases,
    /// Monotonic
    ManageUsers,
    /// Monotonic
    ChangeUserPassword,
    /// Monotonic
    DeleteData,
    /// Monotonic
    ExportData,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::ViewDashboard,
        Capability::ViewReports,
        Capability::RecordVisits,
        Capability::ManagePopulations,
        Capability::ManageHospitals,
        Capability::ManageDiseases,
        Capability::ManageUsers,
        Capability::ChangeUserPassword,
        Capability::DeleteData,
        Capability::ExportData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ViewDashboard => "view_dashboard",
            Capability::ViewReports => "view_reports",
            Capability::RecordVisits => "record_visits",
            Capability::ManagePopulations => "manage_populations",
            Capability::ManageHospitals => "manage_hospitals",
            Capability::ManageDiseases => "manage_diseases",
            Capability::ManageUsers => "manage_users",
            Capability::ChangeUserPassword => "change_user_password",
            Capability::DeleteData => "delete_data",
            Capability::ExportData => "export_data",
        }
    }

    /// Whether every role ranked above a holder also holds it
    pub fn is_rank_monotonic(self) -> bool {
        !matches!(self, Capability::RecordVisits | Capability::ManagePopulations)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|capability| capability.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownCapability(s.to_string()))
    }
}

const SUPERADMIN: &[Capability] = &Capability::ALL;

const ADMIN: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewReports,
    Capability::ManageUsers,
    Capability::ChangeUserPassword,
    Capability::DeleteData,
    Capability::ExportData,
];

const STAFF: &[Capability] = &[
    Capability::ViewDashboard,
    Capability::ViewReports,
    Capability::RecordVisits,
    Capability::ManagePopulations,
];

/// Static grant table of a role
pub fn grants(role: Role) -> &'static [Capability] {
    match role {
        Role::Superadmin => SUPERADMIN,
        Role::Admin => ADMIN,
        Role::Staff => STAFF,
    }
}
