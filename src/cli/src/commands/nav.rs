//! Caller identity and navigation menu.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Debug, Deserialize, Serialize)]
struct NavEntry {
    label: String,
    route: String,
    icon: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NavEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    id: String,
    #[serde(default)]
    email: String,
    role: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Me {
    identity: Identity,
    full_name: String,
    #[serde(default)]
    display_name: Option<String>,
    level: u32,
    #[serde(default)]
    dashboard_widgets: Vec<String>,
}

fn print_tree(entries: &[NavEntry], depth: usize) {
    for entry in entries {
        println!(
            "{}{:<24} {}",
            "  ".repeat(depth + 1),
            entry.label,
            entry.route
        );
        print_tree(&entry.children, depth + 1);
    }
}

pub async fn navigation(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let menu: Vec<NavEntry> = client.get("/api/v1/navigation").await?;

    output::render(&menu, format, |menu| {
        output::heading("Navigation");
        print_tree(menu, 0);
    })
}

pub async fn whoami(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let me: Me = client.get("/api/v1/me").await?;

    output::render(&me, format, |me| {
        output::heading(&me.full_name);
        output::field("ID", &me.identity.id);
        output::field("Email", &me.identity.email);
        output::field("Role", me.display_name.as_deref().unwrap_or(&me.identity.role));
        output::field("Level", &me.level.to_string());
        output::field("Widgets", &me.dashboard_widgets.join(", "));
    })
}
