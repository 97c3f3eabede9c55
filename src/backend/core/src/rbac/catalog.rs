//! The permission catalog: every `(resource, action)` pair the system controls.
//!
//! Role definitions reference these constants instead of spelling resources
//! and actions inline. Adding an entry or an action here never changes what
//! an existing role is granted.

use super::models::{Permission, Resource};

/// One catalog row: a resource and every action defined for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Symbolic key, e.g. `"FINANCE"`.
    pub key: &'static str,
    pub resource: Resource,
    pub actions: &'static [&'static str],
}

impl CatalogEntry {
    /// Grant every action of this entry.
    pub fn grant_all(&self) -> Permission {
        Permission::new(self.resource, self.actions.iter().copied())
    }

    /// Grant a subset of actions. Not validated here; the table tests check
    /// that built-in roles only use catalog actions.
    pub fn grant(&self, actions: &[&str]) -> Permission {
        Permission::new(self.resource, actions.iter().copied())
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.contains(&action)
    }
}

pub const USERS: CatalogEntry = CatalogEntry {
    key: "USERS",
    resource: Resource::Users,
    actions: &["create", "read", "update", "delete", "manage_roles"],
};

pub const STUDENTS: CatalogEntry = CatalogEntry {
    key: "STUDENTS",
    resource: Resource::Students,
    actions: &["create", "read", "update", "delete", "bulk_upload"],
};

pub const STAFF: CatalogEntry = CatalogEntry {
    key: "STAFF",
    resource: Resource::Staff,
    actions: &["create", "read", "update", "delete", "bulk_upload"],
};

pub const COURSES: CatalogEntry = CatalogEntry {
    key: "COURSES",
    resource: Resource::Courses,
    actions: &["create", "read", "update", "delete", "assign_lecturers"],
};

pub const DEPARTMENTS: CatalogEntry = CatalogEntry {
    key: "DEPARTMENTS",
    resource: Resource::Departments,
    actions: &["create", "read", "update", "delete"],
};

pub const ACADEMIC_PLANNING: CatalogEntry = CatalogEntry {
    key: "ACADEMIC_PLANNING",
    resource: Resource::AcademicPlanning,
    actions: &[
        "view_calendar",
        "manage_calendar",
        "view_curriculum",
        "manage_curriculum",
        "approve_programs",
    ],
};

pub const RESULTS: CatalogEntry = CatalogEntry {
    key: "RESULTS",
    resource: Resource::Results,
    actions: &["upload", "read", "update", "approve", "publish"],
};

pub const FINANCE: CatalogEntry = CatalogEntry {
    key: "FINANCE",
    resource: Resource::Finance,
    actions: &["view_payments", "process_payments", "generate_reports", "manage_fees"],
};

pub const STUDENT_AFFAIRS: CatalogEntry = CatalogEntry {
    key: "STUDENT_AFFAIRS",
    resource: Resource::StudentAffairs,
    actions: &["view_records", "manage_welfare", "manage_discipline", "manage_hostels"],
};

pub const MIS: CatalogEntry = CatalogEntry {
    key: "MIS",
    resource: Resource::Mis,
    actions: &["view_reports", "generate_reports", "manage_data", "export_data"],
};

pub const EXAMINATIONS: CatalogEntry = CatalogEntry {
    key: "EXAMINATIONS",
    resource: Resource::Examinations,
    actions: &["schedule", "manage_venues", "view_timetable", "manage_invigilation"],
};

static ENTRIES: [CatalogEntry; 11] = [
    USERS,
    STUDENTS,
    STAFF,
    COURSES,
    DEPARTMENTS,
    ACADEMIC_PLANNING,
    RESULTS,
    FINANCE,
    STUDENT_AFFAIRS,
    MIS,
    EXAMINATIONS,
];

/// Every catalog entry, in catalog order.
pub fn all() -> &'static [CatalogEntry] {
    &ENTRIES
}

/// Look up an entry by symbolic key (`"FINANCE"`).
pub fn lookup(key: &str) -> Option<&'static CatalogEntry> {
    ENTRIES.iter().find(|e| e.key == key)
}

/// The entry describing `resource`.
pub fn entry_for(resource: Resource) -> &'static CatalogEntry {
    // ENTRIES holds exactly one row per Resource variant, in declaration order.
    &ENTRIES[resource as usize]
}
