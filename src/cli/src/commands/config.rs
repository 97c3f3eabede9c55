//! Persisted CLI settings: the server URL and the bearer token.
//!
//! Stored in `~/.campus/config.toml`. Command-line flags and `CAMPUS_*`
//! environment variables take precedence over the file.

use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Store a setting
    Set { key: ConfigKey, value: String },

    /// Print one setting
    Get { key: ConfigKey },

    /// Print every stored setting (token masked)
    Show,

    /// Delete the config file
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Settings the CLI knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Base URL of the campus server
    ApiUrl,
    /// Bearer token sent on `/api/v1` requests
    Token,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiUrl => "api-url",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl CliConfig {
    /// `~/.campus/config.toml`.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".campus").join("config.toml"))
    }

    /// Load from the default path; a missing file is an empty config.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::ApiUrl => self.api_url.as_deref(),
            ConfigKey::Token => self.token.as_deref(),
        }
    }

    /// Validate and store `value` under `key`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            ConfigKey::ApiUrl => {
                let url = reqwest::Url::parse(value)
                    .with_context(|| format!("'{}' is not a valid URL", value))?;
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("api-url must use http or https, got '{}'", url.scheme());
                }
                self.api_url = Some(value.trim_end_matches('/').to_string());
            }
            ConfigKey::Token => {
                if value.is_empty() || value.contains(char::is_whitespace) {
                    bail!("token must be a single non-empty word");
                }
                self.token = Some(value.to_string());
            }
        }
        Ok(())
    }

    /// Stored settings as they may be shown on screen.
    pub fn masked(&self) -> Vec<(ConfigKey, String)> {
        [ConfigKey::ApiUrl, ConfigKey::Token]
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, mask(key, value))))
            .collect()
    }
}

/// Tokens are shortened to their first eight characters.
fn mask(key: ConfigKey, value: &str) -> String {
    match key {
        ConfigKey::Token if value.chars().count() > 8 => {
            format!("{}...", value.chars().take(8).collect::<String>())
        }
        _ => value.to_string(),
    }
}

#[derive(Serialize)]
struct Setting<'a> {
    key: &'a str,
    value: String,
}

pub async fn execute(cmd: ConfigCommands, format: OutputFormat) -> Result<()> {
    let path = CliConfig::path()?;

    match cmd {
        ConfigCommands::Set { key, value } => {
            let mut cfg = CliConfig::load_from(&path)?;
            cfg.set(key, &value)?;
            cfg.save_to(&path)?;

            let shown = cfg.get(key).map(|v| mask(key, v)).unwrap_or_default();
            output::render(&Setting { key: key.as_str(), value: shown }, format, |s| {
                output::ok(&format!("{} = {}", s.key, s.value))
            })?;
        }

        ConfigCommands::Get { key } => {
            let cfg = CliConfig::load_from(&path)?;
            match cfg.get(key) {
                Some(value) => output::render(
                    &Setting { key: key.as_str(), value: value.to_string() },
                    format,
                    |s| println!("{}", s.value),
                )?,
                None => output::error(&format!("'{}' is not set", key)),
            }
        }

        ConfigCommands::Show => {
            let cfg = CliConfig::load_from(&path)?;
            let settings: Vec<_> = cfg
                .masked()
                .into_iter()
                .map(|(key, value)| Setting { key: key.as_str(), value })
                .collect();

            output::render(&settings, format, |settings| {
                if settings.is_empty() {
                    output::info("No settings stored.");
                    return;
                }
                output::heading(&format!("Configuration ({})", path.display()));
                for s in settings {
                    output::field(s.key, &s.value);
                }
            })?;
        }

        ConfigCommands::Reset { force } => {
            if !force {
                output::info("This deletes the stored api-url and token. Use --force to confirm.");
                return Ok(());
            }
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            output::ok("Configuration cleared");
        }
    }

    Ok(())
}
