//! Role-specific navigation menus.
//!
//! Menus are presentation only. A route missing from a menu may still be
//! reachable, and a route present in one is still checked by the guard. The
//! tests in this module and in `tests/navigation_tests.rs` keep the menus
//! consistent with the policy table's route prefixes.

use serde::{Deserialize, Serialize};

use super::roles::PredefinedRole;

/// One menu item, possibly with nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub label: String,
    pub route: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    pub fn new(label: &str, route: &str, icon: &str) -> Self {
        Self {
            label: label.to_string(),
            route: route.to_string(),
            icon: icon.to_string(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NavEntry>) -> Self {
        self.children = children;
        self
    }

    /// This entry's route followed by every descendant route, depth first.
    pub fn routes(&self) -> Vec<&str> {
        let mut out = vec![self.route.as_str()];
        for child in &self.children {
            out.extend(child.routes());
        }
        out
    }
}

/// Every route in a menu, depth first.
pub fn flatten_routes(entries: &[NavEntry]) -> Vec<&str> {
    entries.iter().flat_map(NavEntry::routes).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

fn dashboard() -> NavEntry {
    NavEntry::new("Dashboard", "/dashboard", "layout-dashboard")
}

fn users() -> NavEntry {
    NavEntry::new("Users", "/users", "user-cog")
}

fn students() -> NavEntry {
    NavEntry::new("Students", "/students", "graduation-cap").with_children(vec![
        NavEntry::new("All Students", "/students", "list"),
        NavEntry::new("Add Student", "/students/new", "user-plus"),
    ])
}

fn student_records() -> NavEntry {
    NavEntry::new("Students", "/students", "graduation-cap")
}

fn staff() -> NavEntry {
    NavEntry::new("Staff", "/staff", "users").with_children(vec![
        NavEntry::new("All Staff", "/staff", "list"),
        NavEntry::new("Add Staff", "/staff/new", "user-plus"),
    ])
}

fn staff_records() -> NavEntry {
    NavEntry::new("Staff", "/staff", "users")
}

fn courses() -> NavEntry {
    NavEntry::new("Courses", "/courses", "book-open").with_children(vec![
        NavEntry::new("All Courses", "/courses", "list"),
        NavEntry::new("Lecturer Allocation", "/courses/allocation", "user-check"),
    ])
}

fn departments() -> NavEntry {
    NavEntry::new("Departments", "/departments", "building")
}

fn academic_planning() -> NavEntry {
    NavEntry::new("Academic Planning", "/academic-planning", "calendar").with_children(vec![
        NavEntry::new("Academic Calendar", "/academic-planning/calendar", "calendar-days"),
        NavEntry::new("Curriculum", "/academic-planning/curriculum", "library"),
    ])
}

fn academic_calendar() -> NavEntry {
    NavEntry::new("Academic Calendar", "/academic-planning/calendar", "calendar-days")
}

fn results() -> NavEntry {
    NavEntry::new("Results", "/results", "file-check").with_children(vec![
        NavEntry::new("Result Upload", "/results/upload", "upload"),
        NavEntry::new("Result Approval", "/results/approval", "check-circle"),
    ])
}

fn finance() -> NavEntry {
    NavEntry::new("Finance", "/finance", "wallet").with_children(vec![
        NavEntry::new("Payments", "/finance/payments", "credit-card"),
        NavEntry::new("Fee Structure", "/finance/fees", "receipt"),
    ])
}

fn student_affairs() -> NavEntry {
    NavEntry::new("Student Affairs", "/student-affairs", "heart-handshake").with_children(vec![
        NavEntry::new("Welfare", "/student-affairs/welfare", "heart"),
        NavEntry::new("Hostels", "/student-affairs/hostels", "home"),
        NavEntry::new("Discipline", "/student-affairs/discipline", "gavel"),
    ])
}

fn mis() -> NavEntry {
    NavEntry::new("MIS", "/mis", "database")
}

fn examinations() -> NavEntry {
    NavEntry::new("Examinations", "/examinations", "clipboard-list").with_children(vec![
        NavEntry::new("Timetable", "/examinations/timetable", "clock"),
        NavEntry::new("Venues", "/examinations/venues", "map-pin"),
    ])
}

fn bulk_upload() -> NavEntry {
    NavEntry::new("Bulk Upload", "/bulk-upload", "upload-cloud")
}

fn reports() -> NavEntry {
    NavEntry::new("Reports", "/reports", "bar-chart")
}

fn profile() -> NavEntry {
    NavEntry::new("Profile", "/profile", "user")
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Menu for `role`. Unknown roles get a lone Dashboard entry.
pub fn build_navigation(role: &str) -> Vec<NavEntry> {
    let Some(role) = PredefinedRole::from_id(role) else {
        return vec![dashboard()];
    };

    match role {
        PredefinedRole::Admin => vec![
            dashboard(),
            users(),
            students(),
            staff(),
            courses(),
            departments(),
            academic_planning(),
            results(),
            finance(),
            student_affairs(),
            mis(),
            examinations(),
            bulk_upload(),
            reports(),
            profile(),
        ],
        PredefinedRole::ViceChancellor => vec![
            dashboard(),
            users(),
            student_records(),
            staff_records(),
            courses(),
            departments(),
            academic_planning(),
            results(),
            finance(),
            student_affairs(),
            mis(),
            examinations(),
            reports(),
            profile(),
        ],
        PredefinedRole::DeputyViceChancellor => vec![
            dashboard(),
            student_records(),
            staff_records(),
            courses(),
            departments(),
            academic_planning(),
            results(),
            examinations(),
            reports(),
            profile(),
        ],
        PredefinedRole::Dean => vec![
            dashboard(),
            student_records(),
            staff_records(),
            courses(),
            departments(),
            academic_planning(),
            results(),
            profile(),
        ],
        PredefinedRole::Registrar => vec![
            dashboard(),
            users(),
            students(),
            staff(),
            courses(),
            departments(),
            academic_planning(),
            results(),
            bulk_upload(),
            profile(),
        ],
        PredefinedRole::Hod => vec![
            dashboard(),
            student_records(),
            staff_records(),
            courses(),
            departments(),
            academic_planning(),
            results(),
            examinations(),
            profile(),
        ],
        PredefinedRole::FinanceOfficer => vec![
            dashboard(),
            student_records(),
            finance(),
            reports(),
            profile(),
        ],
        PredefinedRole::ExamOfficer => vec![
            dashboard(),
            student_records(),
            NavEntry::new("Courses", "/courses", "book-open"),
            results(),
            examinations(),
            profile(),
        ],
        PredefinedRole::StudentAffairsOfficer => vec![
            dashboard(),
            student_records(),
            student_affairs(),
            profile(),
        ],
        PredefinedRole::MisOfficer => vec![
            dashboard(),
            users(),
            student_records(),
            staff_records(),
            mis(),
            bulk_upload(),
            reports(),
            profile(),
        ],
        PredefinedRole::Lecturer => vec![
            dashboard(),
            NavEntry::new("My Courses", "/courses", "book-open"),
            student_records(),
            NavEntry::new("Results", "/results", "file-check").with_children(vec![
                NavEntry::new("Upload Results", "/results/upload", "upload"),
            ]),
            NavEntry::new("Exam Timetable", "/examinations/timetable", "clock"),
            academic_calendar(),
            profile(),
        ],
        PredefinedRole::Student => vec![
            dashboard(),
            NavEntry::new("My Courses", "/my-courses", "book-open"),
            NavEntry::new("Course Registration", "/course-registration", "clipboard-pen"),
            NavEntry::new("My Results", "/my-results", "award"),
            NavEntry::new("Payments", "/payments", "credit-card"),
            profile(),
        ],
    }
}
