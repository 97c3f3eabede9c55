//! Dashboard widgets, looked up by the ids listed in the policy table.

pub mod registry;

pub use registry::{DashboardWidget, RenderedWidget, SummaryWidget, WidgetRegistry};
