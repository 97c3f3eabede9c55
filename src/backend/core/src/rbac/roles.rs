//! Predefined university roles and the role policy table.
//!
//! | Role                      | Level | Description                                         |
//! |---------------------------|-------|-----------------------------------------------------|
//! | admin                     | 100   | Full access to every resource and route             |
//! | vice_chancellor           | 95    | Institution-wide oversight and approvals            |
//! | deputy_vice_chancellor    | 90    | Academic affairs: curriculum, calendar, results     |
//! | dean                      | 80    | Faculty oversight                                   |
//! | registrar                 | 75    | Admissions, records, staff onboarding               |
//! | hod                       | 70    | Department courses and result approval              |
//! | finance_officer           | 65    | Payments, fees, financial reporting                 |
//! | exam_officer              | 65    | Examination scheduling and result publication       |
//! | student_affairs_officer   | 60    | Welfare, hostels, discipline                        |
//! | mis_officer               | 60    | Management information and bulk data import         |
//! | lecturer                  | 50    | Teaching and result upload                          |
//! | student                   | 10    | Student portal                                      |

use std::collections::HashMap;
use std::sync::OnceLock;

use super::catalog::{
    ACADEMIC_PLANNING, COURSES, DEPARTMENTS, EXAMINATIONS, FINANCE, MIS, RESULTS, STAFF,
    STUDENTS, STUDENT_AFFAIRS, USERS,
};
use super::models::{Permission, Role, ROUTE_WILDCARD};

// ═══════════════════════════════════════════════════════════════════════════════
// Predefined Roles
// ═══════════════════════════════════════════════════════════════════════════════

/// Built-in role templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedRole {
    Admin,
    ViceChancellor,
    DeputyViceChancellor,
    Dean,
    Registrar,
    Hod,
    FinanceOfficer,
    ExamOfficer,
    StudentAffairsOfficer,
    MisOfficer,
    Lecturer,
    Student,
}

impl PredefinedRole {
    /// Get the role identifier string.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ViceChancellor => "vice_chancellor",
            Self::DeputyViceChancellor => "deputy_vice_chancellor",
            Self::Dean => "dean",
            Self::Registrar => "registrar",
            Self::Hod => "hod",
            Self::FinanceOfficer => "finance_officer",
            Self::ExamOfficer => "exam_officer",
            Self::StudentAffairsOfficer => "student_affairs_officer",
            Self::MisOfficer => "mis_officer",
            Self::Lecturer => "lecturer",
            Self::Student => "student",
        }
    }

    /// Resolve a role id string. Unknown ids are `None`, not an error.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|r| r.id() == id)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "System Administrator",
            Self::ViceChancellor => "Vice Chancellor",
            Self::DeputyViceChancellor => "Deputy Vice Chancellor",
            Self::Dean => "Dean of Faculty",
            Self::Registrar => "Registrar",
            Self::Hod => "Head of Department",
            Self::FinanceOfficer => "Finance Officer",
            Self::ExamOfficer => "Examinations Officer",
            Self::StudentAffairsOfficer => "Student Affairs Officer",
            Self::MisOfficer => "MIS Officer",
            Self::Lecturer => "Lecturer",
            Self::Student => "Student",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full access to all resources, routes and system settings",
            Self::ViceChancellor => "Institution-wide oversight with approval authority",
            Self::DeputyViceChancellor => "Academic affairs: curriculum, calendar and examinations",
            Self::Dean => "Oversees departments, courses and results within a faculty",
            Self::Registrar => "Manages admissions, student and staff records",
            Self::Hod => "Manages department courses, lecturers and result approval",
            Self::FinanceOfficer => "Handles payments, fees and financial reporting",
            Self::ExamOfficer => "Schedules examinations and publishes results",
            Self::StudentAffairsOfficer => "Handles student welfare, hostels and discipline",
            Self::MisOfficer => "Maintains management information and bulk data imports",
            Self::Lecturer => "Teaches courses and uploads student results",
            Self::Student => "Registers for courses and views results and payments",
        }
    }

    /// Authority level used by role-management comparisons.
    pub fn level(&self) -> u32 {
        match self {
            Self::Admin => 100,
            Self::ViceChancellor => 95,
            Self::DeputyViceChancellor => 90,
            Self::Dean => 80,
            Self::Registrar => 75,
            Self::Hod => 70,
            Self::FinanceOfficer => 65,
            Self::ExamOfficer => 65,
            Self::StudentAffairsOfficer => 60,
            Self::MisOfficer => 60,
            Self::Lecturer => 50,
            Self::Student => 10,
        }
    }

    /// Permission entries for this role.
    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            // Redundant with the admin bypass; listed so the table reads completely.
            Self::Admin => super::catalog::all().iter().map(|e| e.grant_all()).collect(),
            Self::ViceChancellor => vec![
                USERS.grant(&["read"]),
                STUDENTS.grant(&["read"]),
                STAFF.grant(&["read"]),
                COURSES.grant(&["read"]),
                DEPARTMENTS.grant(&["read"]),
                ACADEMIC_PLANNING.grant(&["view_calendar", "view_curriculum", "approve_programs"]),
                RESULTS.grant(&["read", "approve"]),
                FINANCE.grant(&["view_payments", "generate_reports"]),
                STUDENT_AFFAIRS.grant(&["view_records"]),
                MIS.grant(&["view_reports", "generate_reports"]),
                EXAMINATIONS.grant(&["view_timetable"]),
            ],
            Self::DeputyViceChancellor => vec![
                STUDENTS.grant(&["read"]),
                STAFF.grant(&["read"]),
                COURSES.grant(&["read", "update"]),
                DEPARTMENTS.grant(&["read"]),
                ACADEMIC_PLANNING.grant(&[
                    "view_calendar",
                    "manage_calendar",
                    "view_curriculum",
                    "manage_curriculum",
                ]),
                RESULTS.grant(&["read", "approve"]),
                EXAMINATIONS.grant(&["view_timetable", "schedule"]),
                MIS.grant(&["view_reports"]),
            ],
            Self::Dean => vec![
                STUDENTS.grant(&["read"]),
                STAFF.grant(&["read"]),
                COURSES.grant(&["read", "update", "assign_lecturers"]),
                DEPARTMENTS.grant(&["read", "update"]),
                ACADEMIC_PLANNING.grant(&["view_calendar", "view_curriculum", "manage_curriculum"]),
                RESULTS.grant(&["read", "approve"]),
            ],
            Self::Registrar => vec![
                USERS.grant(&["create", "read", "update"]),
                STUDENTS.grant_all(),
                STAFF.grant(&["create", "read", "update", "bulk_upload"]),
                COURSES.grant(&["read"]),
                DEPARTMENTS.grant(&["read"]),
                ACADEMIC_PLANNING.grant(&["view_calendar", "manage_calendar"]),
                RESULTS.grant(&["read", "publish"]),
            ],
            Self::Hod => vec![
                STUDENTS.grant(&["read"]),
                STAFF.grant(&["read"]),
                COURSES.grant(&["create", "read", "update", "assign_lecturers"]),
                DEPARTMENTS.grant(&["read"]),
                ACADEMIC_PLANNING.grant(&["view_calendar", "view_curriculum"]),
                RESULTS.grant(&["read", "update"]),
                // Departmental approval is a separate grant on the same resource.
                RESULTS.grant(&["approve"]),
                EXAMINATIONS.grant(&["view_timetable"]),
            ],
            Self::FinanceOfficer => vec![
                STUDENTS.grant(&["read"]),
                FINANCE.grant_all(),
                MIS.grant(&["view_reports"]),
            ],
            Self::ExamOfficer => vec![
                STUDENTS.grant(&["read"]),
                COURSES.grant(&["read"]),
                RESULTS.grant(&["read", "publish"]),
                EXAMINATIONS.grant_all(),
            ],
            Self::StudentAffairsOfficer => vec![
                STUDENTS.grant(&["read", "update"]),
                STUDENT_AFFAIRS.grant_all(),
            ],
            Self::MisOfficer => vec![
                USERS.grant(&["read"]),
                STUDENTS.grant(&["read", "bulk_upload"]),
                STAFF.grant(&["read", "bulk_upload"]),
                MIS.grant_all(),
            ],
            Self::Lecturer => vec![
                STUDENTS.grant(&["read"]),
                COURSES.grant(&["read"]),
                RESULTS.grant(&["upload", "read", "update"]),
                EXAMINATIONS.grant(&["view_timetable"]),
                ACADEMIC_PLANNING.grant(&["view_calendar"]),
            ],
            Self::Student => vec![
                COURSES.grant(&["read"]),
                RESULTS.grant(&["read"]),
                FINANCE.grant(&["view_payments"]),
                ACADEMIC_PLANNING.grant(&["view_calendar"]),
            ],
        }
    }

    /// Route prefixes this role may navigate to.
    pub fn route_prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::Admin => &[ROUTE_WILDCARD],
            Self::ViceChancellor => &[
                "/dashboard",
                "/users",
                "/students",
                "/staff",
                "/courses",
                "/departments",
                "/academic-planning",
                "/results",
                "/finance",
                "/student-affairs",
                "/mis",
                "/examinations",
                "/reports",
                "/profile",
            ],
            Self::DeputyViceChancellor => &[
                "/dashboard",
                "/students",
                "/staff",
                "/courses",
                "/departments",
                "/academic-planning",
                "/results",
                "/examinations",
                "/reports",
                "/profile",
            ],
            Self::Dean => &[
                "/dashboard",
                "/students",
                "/staff",
                "/courses",
                "/departments",
                "/academic-planning",
                "/results",
                "/profile",
            ],
            Self::Registrar => &[
                "/dashboard",
                "/users",
                "/students",
                "/staff",
                "/courses",
                "/departments",
                "/academic-planning",
                "/results",
                "/bulk-upload",
                "/profile",
            ],
            Self::Hod => &[
                "/dashboard",
                "/students",
                "/staff",
                "/courses",
                "/departments",
                "/academic-planning",
                "/results",
                "/examinations",
                "/profile",
            ],
            Self::FinanceOfficer => &["/dashboard", "/students", "/finance", "/reports", "/profile"],
            Self::ExamOfficer => &[
                "/dashboard",
                "/students",
                "/courses",
                "/results",
                "/examinations",
                "/profile",
            ],
            Self::StudentAffairsOfficer => &["/dashboard", "/students", "/student-affairs", "/profile"],
            Self::MisOfficer => &[
                "/dashboard",
                "/users",
                "/students",
                "/staff",
                "/mis",
                "/bulk-upload",
                "/reports",
                "/profile",
            ],
            Self::Lecturer => &[
                "/dashboard",
                "/courses",
                "/students",
                "/results",
                "/examinations",
                "/academic-planning/calendar",
                "/profile",
            ],
            Self::Student => &[
                "/dashboard",
                "/my-courses",
                "/my-results",
                "/payments",
                "/course-registration",
                "/profile",
            ],
        }
    }

    /// Dashboard widget ids, in display order.
    pub fn dashboard_widgets(&self) -> &'static [&'static str] {
        match self {
            Self::Admin => &[
                "system_overview",
                "user_statistics",
                "enrollment_trends",
                "financial_summary",
                "pending_approvals",
                "recent_activity",
            ],
            Self::ViceChancellor => &[
                "institution_overview",
                "enrollment_trends",
                "financial_summary",
                "pending_approvals",
                "performance_metrics",
            ],
            Self::DeputyViceChancellor => &[
                "academic_overview",
                "enrollment_trends",
                "pending_approvals",
                "exam_schedule",
            ],
            Self::Dean => &[
                "faculty_overview",
                "department_performance",
                "pending_approvals",
                "course_statistics",
            ],
            Self::Registrar => &[
                "enrollment_trends",
                "registration_status",
                "staff_statistics",
                "recent_activity",
            ],
            Self::Hod => &[
                "department_overview",
                "course_statistics",
                "result_uploads",
                "pending_approvals",
            ],
            Self::FinanceOfficer => &[
                "financial_summary",
                "payment_status",
                "outstanding_fees",
                "revenue_trends",
            ],
            Self::ExamOfficer => &["exam_schedule", "result_processing", "venue_allocation"],
            Self::StudentAffairsOfficer => &["welfare_cases", "hostel_occupancy", "disciplinary_cases"],
            Self::MisOfficer => &["data_quality", "mis_reports", "system_usage"],
            Self::Lecturer => &["my_courses", "result_uploads", "class_schedule"],
            Self::Student => &["my_courses", "my_results", "payment_status", "academic_calendar"],
        }
    }

    /// Build a full `Role` struct from this predefined role.
    pub fn to_role(&self) -> Role {
        Role::new(self.id(), self.display_name(), self.description(), self.level())
            .with_permissions(self.permissions())
            .with_routes(self.route_prefixes().iter().copied())
            .with_widgets(self.dashboard_widgets().iter().copied())
    }

    /// Return all predefined roles, highest authority first.
    pub fn all() -> Vec<PredefinedRole> {
        vec![
            Self::Admin,
            Self::ViceChancellor,
            Self::DeputyViceChancellor,
            Self::Dean,
            Self::Registrar,
            Self::Hod,
            Self::FinanceOfficer,
            Self::ExamOfficer,
            Self::StudentAffairsOfficer,
            Self::MisOfficer,
            Self::Lecturer,
            Self::Student,
        ]
    }

    /// Return all predefined roles as `Role` structs.
    pub fn all_defaults() -> Vec<Role> {
        Self::all().into_iter().map(|r| r.to_role()).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role Policy
// ═══════════════════════════════════════════════════════════════════════════════

/// Read access to the current role policy.
///
/// The evaluator only talks to this trait, so a persistence-backed store can
/// replace the compiled-in table without touching callers.
pub trait RolePolicy: Send + Sync {
    /// Look up a role. `None` is an expected outcome for unknown or legacy ids.
    fn role(&self, id: &str) -> Option<&Role>;

    /// Every role id, in table order.
    fn role_ids(&self) -> Vec<String>;
}

/// Immutable, insertion-ordered role table.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    roles: Vec<Role>,
    index: HashMap<String, usize>,
}

static BUILTIN: OnceLock<PolicyTable> = OnceLock::new();

impl PolicyTable {
    /// Build a table from roles. A later role with a duplicate id replaces the
    /// earlier one in place.
    pub fn from_roles(roles: Vec<Role>) -> Self {
        let mut table = Self::default();
        for role in roles {
            match table.index.get(&role.id) {
                Some(&i) => table.roles[i] = role,
                None => {
                    table.index.insert(role.id.clone(), table.roles.len());
                    table.roles.push(role);
                }
            }
        }
        table
    }

    /// The compiled-in table, built once on first use.
    pub fn builtin() -> &'static PolicyTable {
        BUILTIN.get_or_init(|| Self::from_roles(PredefinedRole::all_defaults()))
    }

    pub fn get_role(&self, id: &str) -> Option<&Role> {
        self.index.get(id).map(|&i| &self.roles[i])
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RolePolicy for PolicyTable {
    fn role(&self, id: &str) -> Option<&Role> {
        self.get_role(id)
    }

    fn role_ids(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.id.clone()).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::catalog;

    #[test]
    fn test_twelve_roles_with_unique_ids() {
        let table = PolicyTable::builtin();
        assert_eq!(table.len(), 12);
        assert_eq!(PredefinedRole::all().len(), 12);
        for role in PredefinedRole::all() {
            assert_eq!(table.get_role(role.id()).unwrap().id, role.id());
        }
    }

    #[test]
    fn test_role_ids_round_trip() {
        for role in PredefinedRole::all() {
            assert_eq!(PredefinedRole::from_id(role.id()), Some(role));
        }
        assert_eq!(PredefinedRole::from_id("chancellor"), None);
    }

    #[test]
    fn test_grants_only_catalog_actions() {
        for role in PolicyTable::builtin().roles() {
            for perm in &role.permissions {
                let entry = catalog::entry_for(perm.resource);
                for action in &perm.actions {
                    assert!(
                        entry.contains(action),
                        "{} grants {}:{} which is not in the catalog",
                        role.id,
                        perm.resource,
                        action
                    );
                }
                assert!(!perm.actions.is_empty(), "{} has an empty grant", role.id);
            }
        }
    }

    #[test]
    fn test_levels_follow_hierarchy() {
        use PredefinedRole::*;
        assert!(Admin.level() > ViceChancellor.level());
        assert!(ViceChancellor.level() > DeputyViceChancellor.level());
        assert!(DeputyViceChancellor.level() > Dean.level());
        assert!(Dean.level() > Registrar.level());
        assert_eq!(Registrar.level(), 75);
        assert_eq!(Hod.level(), 70);
        assert_eq!(Lecturer.level(), 50);
        assert!(Lecturer.level() > Student.level());
    }

    #[test]
    fn test_only_admin_has_wildcard_routes() {
        for role in PolicyTable::builtin().roles() {
            let wildcard = role.allowed_route_prefixes.iter().any(|p| p == ROUTE_WILDCARD);
            assert_eq!(wildcard, role.id == "admin", "{}", role.id);
        }
    }

    #[test]
    fn test_route_prefixes_are_canonical() {
        for role in PolicyTable::builtin().roles() {
            for prefix in &role.allowed_route_prefixes {
                if prefix == ROUTE_WILDCARD {
                    continue;
                }
                assert!(prefix.starts_with('/'), "{}: {}", role.id, prefix);
                assert!(!prefix.ends_with('/'), "{}: {}", role.id, prefix);
            }
        }
    }

    #[test]
    fn test_hod_lists_results_twice() {
        let hod = PredefinedRole::Hod.to_role();
        let results_entries = hod
            .permissions
            .iter()
            .filter(|p| p.resource == crate::rbac::models::Resource::Results)
            .count();
        assert_eq!(results_entries, 2);
    }

    #[test]
    fn test_from_roles_replaces_duplicate_ids() {
        let table = PolicyTable::from_roles(vec![
            Role::new("x", "First", "", 1),
            Role::new("y", "Other", "", 2),
            Role::new("x", "Second", "", 3),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_role("x").unwrap().display_name, "Second");
        assert_eq!(table.role_ids(), vec!["x".to_string(), "y".to_string()]);
    }
}
