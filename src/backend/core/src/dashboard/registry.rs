//! Widget registry keyed by widget id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::rbac::policy::PolicyEngine;
use crate::rbac::roles::PolicyTable;

/// A renderable dashboard widget.
pub trait DashboardWidget: Send + Sync {
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    /// Render the widget from the dashboard data payload.
    fn render(&self, data: &Value) -> RenderedWidget;
}

/// Output of [`DashboardWidget::render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedWidget {
    pub id: String,
    pub title: String,
    pub data: Value,
}

/// Generic widget that shows the payload entry named after its id.
#[derive(Debug, Clone)]
pub struct SummaryWidget {
    id: String,
    title: String,
}

impl SummaryWidget {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let title = title_from_id(&id);
        Self { id, title }
    }
}

impl DashboardWidget for SummaryWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn render(&self, data: &Value) -> RenderedWidget {
        RenderedWidget {
            id: self.id.clone(),
            title: self.title.clone(),
            data: data.get(&self.id).cloned().unwrap_or(Value::Null),
        }
    }
}

/// `"financial_summary"` -> `"Financial Summary"`.
fn title_from_id(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    widgets: HashMap<String, Arc<dyn DashboardWidget>>,
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.widgets.keys().collect();
        ids.sort();
        f.debug_struct("WidgetRegistry").field("widgets", &ids).finish()
    }
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`SummaryWidget`] for every widget id the built-in table uses.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for role in PolicyTable::builtin().roles() {
            for id in &role.dashboard_widgets {
                if !registry.contains(id) {
                    registry.register(SummaryWidget::new(id.as_str()));
                }
            }
        }
        registry
    }

    /// Register a widget, replacing any existing one with the same id.
    pub fn register<W>(&mut self, widget: W)
    where
        W: DashboardWidget + 'static,
    {
        self.widgets.insert(widget.id().to_string(), Arc::new(widget));
    }

    /// `None` means no widget is registered under `id`.
    pub fn lookup(&self, id: &str) -> Option<Arc<dyn DashboardWidget>> {
        self.widgets.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Render `role`'s widgets in table order, skipping unregistered ids.
    pub fn render_for_role(
        &self,
        engine: &PolicyEngine,
        role: &str,
        data: &Value,
    ) -> Vec<RenderedWidget> {
        engine
            .dashboard_widgets(role)
            .iter()
            .filter_map(|id| match self.lookup(id) {
                Some(widget) => Some(widget.render(data)),
                None => {
                    debug!(widget = %id, role = %role, "No widget registered");
                    None
                }
            })
            .collect()
    }
}
