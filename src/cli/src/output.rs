//! Terminal rendering for server responses.
//!
//! Each command reports one value. In `json`/`yaml` mode that value is printed
//! as-is so it can be piped; in `table` mode the command draws it for a human.

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable tables and verdicts
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Machine-readable encoding of `value`; `None` in table mode.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Option<String>> {
        Ok(match self {
            Self::Table => None,
            Self::Json => Some(serde_json::to_string_pretty(value)?),
            Self::Yaml => Some(serde_yaml::to_string(value)?),
        })
    }
}

/// Print `value` encoded, or hand it to `draw` in table mode.
pub fn render<T, F>(value: &T, format: OutputFormat, draw: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T),
{
    match format.encode(value)? {
        Some(text) => println!("{}", text.trim_end()),
        None => draw(value),
    }
    Ok(())
}

/// Rounded table with a left-aligned key column, or `empty` when there are
/// no rows.
pub fn table<T: Tabled>(rows: &[T], empty: &str) -> String {
    if rows.is_empty() {
        return empty.dimmed().to_string();
    }
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string()
}

/// `[ALLOW] subject` / `[DENY] subject`.
pub fn verdict(allowed: bool, subject: &str) -> String {
    let tag = if allowed {
        "[ALLOW]".green().bold()
    } else {
        "[DENY]".red().bold()
    };
    format!("{} {}", tag, subject)
}

pub fn heading(title: &str) {
    println!("\n{}\n", title.bold().underline());
}

pub fn field(label: &str, value: &str) {
    println!("  {:<12} {}", format!("{}:", label).cyan(), value);
}

pub fn ok(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", "[INFO]".blue().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Role")]
        role: &'static str,
        #[tabled(rename = "Level")]
        level: u32,
    }

    #[test]
    fn test_table_mode_does_not_encode() {
        assert!(OutputFormat::Table.encode(&json!({ "allow": true })).unwrap().is_none());
    }

    #[test]
    fn test_structured_encodings() {
        let outcome = json!({ "allow": false, "redirectTo": "/login" });

        let text = OutputFormat::Json.encode(&outcome).unwrap().unwrap();
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, outcome);

        let text = OutputFormat::Yaml.encode(&outcome).unwrap().unwrap();
        assert!(text.contains("redirectTo: /login"));
    }

    #[test]
    fn test_table_rows_and_empty() {
        let rendered = table(
            &[Row { role: "hod", level: 70 }, Row { role: "lecturer", level: 50 }],
            "No roles.",
        );
        assert!(rendered.contains("Role"));
        assert!(rendered.contains("lecturer"));

        assert!(table::<Row>(&[], "No roles.").contains("No roles."));
    }

    #[test]
    fn test_verdict_tags() {
        assert!(verdict(true, "lecturer -> /results").contains("[ALLOW]"));
        let denied = verdict(false, "student -> /finance");
        assert!(denied.contains("[DENY]"));
        assert!(denied.ends_with("student -> /finance"));
    }
}
