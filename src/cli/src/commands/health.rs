//! Health check command.
//!
//! Queries the public `/health` endpoint; no token is needed.

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

pub async fn execute(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: serde_json::Value = client.get_raw("/health").await?;

    output::render(&health, format, |health| {
        let text = |key: &str| health.get(key).and_then(|v| v.as_str());
        let status = text("status").unwrap_or("unknown");

        output::heading("Server Health");
        output::field("Status", status);
        output::field("API URL", client.base_url());
        if let Some(version) = text("version") {
            output::field("Version", version);
        }
        if let Some(ts) = text("timestamp") {
            output::field("Timestamp", ts);
        }

        if status == "healthy" {
            output::ok("Server is up");
        } else {
            output::error(&format!("Server status: {}", status));
        }
    })
}
