//! Route guard evaluation.

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct GuardArgs {
    /// Path being navigated to
    path: String,

    /// Evaluate as this role instead of the caller
    #[arg(short, long)]
    role: Option<String>,

    /// Evaluate as an anonymous visitor
    #[arg(long, conflicts_with = "role")]
    anonymous: bool,

    /// Required permission (resource:action)
    #[arg(short, long)]
    permission: Option<String>,

    /// Roles allowed on the route (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    allow: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RequiredPermission {
    resource: String,
    action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GuardCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    current_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_authenticated: Option<bool>,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_permission: Option<RequiredPermission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct GuardOutcome {
    allow: bool,
    #[serde(default)]
    redirect_to: Option<String>,
    #[serde(default)]
    return_to: Option<String>,
    #[serde(default)]
    denied_by: Option<String>,
}

fn build_request(args: GuardArgs) -> Result<GuardCheck> {
    let required_permission = match args.permission {
        Some(p) => {
            let (resource, action) = p
                .split_once(':')
                .filter(|(r, a)| !r.is_empty() && !a.is_empty())
                .ok_or_else(|| anyhow::anyhow!("permission must look like resource:action"))?;
            Some(RequiredPermission {
                resource: resource.to_string(),
                action: action.to_string(),
            })
        }
        None => None,
    };

    let (current_role, is_authenticated) = if args.anonymous {
        (None, Some(false))
    } else {
        (args.role, None)
    };

    Ok(GuardCheck {
        current_role,
        is_authenticated,
        path: args.path,
        required_permission,
        allowed_roles: (!args.allow.is_empty()).then_some(args.allow),
    })
}

pub async fn execute(args: GuardArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let path = args.path.clone();
    let body = build_request(args)?;
    let outcome: GuardOutcome = client.post("/api/v1/guard", &body).await?;

    output::render(&outcome, format, |outcome| {
        if outcome.allow {
            println!("{}", output::verdict(true, &path));
            return;
        }
        let mut subject = format!(
            "{} -> redirect to {}",
            path,
            outcome.redirect_to.as_deref().unwrap_or("?")
        );
        if let Some(step) = &outcome.denied_by {
            subject.push_str(&format!(" (denied by {})", step));
        }
        println!("{}", output::verdict(false, &subject));
        if let Some(return_to) = &outcome.return_to {
            output::field("Return to", return_to);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: &str) -> GuardArgs {
        GuardArgs {
            path: path.to_string(),
            role: None,
            anonymous: false,
            permission: None,
            allow: Vec::new(),
        }
    }

    #[test]
    fn test_caller_request_omits_identity() {
        let body = serde_json::to_value(build_request(args("/results")).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "path": "/results" }));
    }

    #[test]
    fn test_anonymous_request() {
        let mut a = args("/results");
        a.anonymous = true;
        let body = serde_json::to_value(build_request(a).unwrap()).unwrap();
        assert_eq!(body["isAuthenticated"], false);
        assert!(body.get("currentRole").is_none());
    }

    #[test]
    fn test_permission_parsing() {
        let mut a = args("/finance");
        a.permission = Some("finance:view_payments".into());
        let body = serde_json::to_value(build_request(a).unwrap()).unwrap();
        assert_eq!(body["requiredPermission"]["resource"], "finance");

        let mut bad = args("/finance");
        bad.permission = Some("finance".into());
        assert!(build_request(bad).is_err());
    }
}
