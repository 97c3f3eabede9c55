//! Configuration management.
//!
//! Sources, lowest precedence first:
//! 1. serde defaults
//! 2. the file named by `CAMPUS_CONFIG` (any format the `config` crate reads)
//! 3. `CAMPUS__<SECTION>__<KEY>` environment variables

use serde::Deserialize;

use crate::error::CampusError;
use crate::middleware::auth::AuthConfig;
use crate::rbac::guard::GuardConfig;
use crate::telemetry::TelemetryConfig;

pub const ENV_PREFIX: &str = "CAMPUS";
pub const CONFIG_PATH_ENV: &str = "CAMPUS_CONFIG";

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Redirect targets for the route guard
    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS; empty means any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load from `CAMPUS_CONFIG` (if set) and the environment.
    pub fn load() -> Result<Self, CampusError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::build(path.as_deref())
    }

    /// Load from a specific file path, then the environment.
    pub fn from_file(path: &str) -> Result<Self, CampusError> {
        Self::build(Some(path))
    }

    fn build(path: Option<&str>) -> Result<Self, CampusError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.public_paths")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(CampusError::configuration(
                "auth.jwt_secret must be set (CAMPUS__AUTH__JWT_SECRET)",
            ));
        }
        if !self.guard.login_path.starts_with('/') || !self.guard.fallback_path.starts_with('/') {
            return Err(CampusError::configuration(
                "guard.login_path and guard.fallback_path must be absolute paths",
            ));
        }
        Ok(())
    }
}
