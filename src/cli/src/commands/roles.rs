//! Role and permission catalog commands.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum RoleCommands {
    /// List every role with its level
    List,

    /// Show a role's permissions, routes and manageable roles
    Show {
        /// Role ID (e.g., lecturer)
        role_id: String,
    },

    /// Show the permission catalog (admin only)
    Catalog,
}

// ── API response types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct RoleSummary {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Level")]
    level: u32,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Role {
    id: String,
    display_name: String,
    description: String,
    level: u32,
    #[serde(default)]
    allowed_route_prefixes: Vec<String>,
    #[serde(default)]
    dashboard_widgets: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleDetail {
    role: Role,
    effective_permissions: BTreeMap<String, Vec<String>>,
    manageable_roles: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Tabled)]
struct CatalogRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Actions", display_with = "join_actions")]
    actions: Vec<String>,
}

fn join_actions(actions: &[String]) -> String {
    actions.join(", ")
}

pub async fn execute(cmd: RoleCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        RoleCommands::List => {
            let mut roles: Vec<RoleSummary> = client.get("/api/v1/rbac/roles").await?;
            roles.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.id.cmp(&b.id)));
            output::render(&roles, format, |roles| {
                println!("{}", output::table(roles, "No roles defined."))
            })?;
        }

        RoleCommands::Show { role_id } => {
            let detail: RoleDetail = client
                .get(&format!("/api/v1/rbac/roles/{}", role_id))
                .await?;

            output::render(&detail, format, |detail| {
                let role = &detail.role;
                output::heading(&format!("{} ({})", role.display_name, role.id));
                output::field("Description", &role.description);
                output::field("Level", &role.level.to_string());
                output::field("Routes", &role.allowed_route_prefixes.join(", "));
                output::field("Widgets", &role.dashboard_widgets.join(", "));
                output::field("Manages", &detail.manageable_roles.join(", "));

                let grants: Vec<CatalogRow> = detail
                    .effective_permissions
                    .iter()
                    .map(|(resource, actions)| CatalogRow {
                        key: resource.to_uppercase(),
                        resource: resource.clone(),
                        actions: actions.clone(),
                    })
                    .collect();
                output::heading("Permissions");
                println!("{}", output::table(&grants, "No permissions granted."));
            })?;
        }

        RoleCommands::Catalog => {
            let entries: Vec<CatalogRow> = client.get("/api/v1/rbac/catalog").await?;
            output::render(&entries, format, |entries| {
                println!("{}", output::table(entries, "Catalog is empty."))
            })?;
        }
    }

    Ok(())
}
