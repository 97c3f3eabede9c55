//! Campus CLI - Command-line interface for the Campus authorization server.
//!
//! Provides commands for roles, permission checks, route guard decisions,
//! navigation, health, and configuration management.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check, config, guard, health, nav, roles};
use output::OutputFormat;

/// Campus - university access control CLI
#[derive(Parser)]
#[command(
    name = "campus",
    author = "Aezi <aezi.zhu@icloud.com>",
    version = "0.1.0",
    about = "Campus - role-based access control for university administration",
    long_about = "CLI tool for inspecting roles, checking permissions and evaluating route guards on a Campus server.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "CAMPUS_API_URL")]
    api_url: Option<String>,

    /// Bearer token for authenticated endpoints
    #[arg(long, global = true, env = "CAMPUS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Role and catalog queries
    #[command(subcommand)]
    Roles(roles::RoleCommands),

    /// Permission, route and hierarchy checks
    #[command(subcommand)]
    Check(check::CheckCommands),

    /// Evaluate the route guard for a path
    Guard(guard::GuardArgs),

    /// Show the navigation menu for the caller's role
    Nav,

    /// Show the caller's identity and role
    Whoami,

    /// Check server health
    Health,

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let stored = match config::CliConfig::load() {
        Ok(stored) => stored,
        Err(e) => {
            output::error(&format!("Ignoring stored configuration: {:#}", e));
            config::CliConfig::default()
        }
    };
    let api_url = cli
        .api_url
        .clone()
        .or(stored.api_url)
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let token = cli.token.clone().or(stored.token);

    let client = client::ApiClient::new(&api_url, token)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Roles(cmd) => roles::execute(cmd, &client, format).await,
        Commands::Check(cmd) => check::execute(cmd, &client, format).await,
        Commands::Guard(args) => guard::execute(args, &client, format).await,
        Commands::Nav => nav::navigation(&client, format).await,
        Commands::Whoami => nav::whoami(&client, format).await,
        Commands::Health => health::execute(&client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
