//! Ad-hoc authorization checks against the server's evaluator.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum CheckCommands {
    /// Check whether a role holds `resource:action`
    Permission {
        /// Permission string (e.g., finance:view_payments)
        permission: String,

        /// Role to check; defaults to the caller's role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Check whether a role may visit a path
    Route {
        /// Path (e.g., /finance/payments)
        path: String,

        /// Role to check; defaults to the caller's role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Check whether one role may manage another
    Manage {
        /// Managing role
        manager: String,
        /// Managed role
        target: String,
    },
}

#[derive(Debug, Serialize)]
struct PermissionCheck<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    permission: &'a str,
}

#[derive(Debug, Serialize)]
struct RouteCheck<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    path: &'a str,
}

#[derive(Debug, Deserialize, Serialize)]
struct CheckResponse {
    role: String,
    allowed: bool,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManageResponse {
    allowed: bool,
    manager_level: u32,
    target_level: u32,
}

pub async fn execute(cmd: CheckCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        CheckCommands::Permission { permission, role } => {
            let body = PermissionCheck {
                role: role.as_deref(),
                permission: &permission,
            };
            let resp: CheckResponse = client
                .post("/api/v1/rbac/permissions/check", &body)
                .await?;

            output::render(&resp, format, |r| {
                let mut subject = format!("{} -> {}", r.role, permission);
                if let Some(reason) = &r.reason {
                    subject.push_str(&format!(" ({})", reason));
                }
                println!("{}", output::verdict(r.allowed, &subject));
            })?;
        }

        CheckCommands::Route { path, role } => {
            let body = RouteCheck {
                role: role.as_deref(),
                path: &path,
            };
            let resp: CheckResponse = client.post("/api/v1/rbac/routes/check", &body).await?;

            output::render(&resp, format, |r| {
                println!("{}", output::verdict(r.allowed, &format!("{} -> {}", r.role, path)))
            })?;
        }

        CheckCommands::Manage { manager, target } => {
            let resp: ManageResponse = client
                .get_query(
                    "/api/v1/rbac/manage",
                    &[("manager", manager.as_str()), ("target", target.as_str())],
                )
                .await?;

            output::render(&resp, format, |r| {
                let subject = format!(
                    "{} (level {}) manages {} (level {})",
                    manager, r.manager_level, target, r.target_level
                );
                println!("{}", output::verdict(r.allowed, &subject));
            })?;
        }
    }

    Ok(())
}
