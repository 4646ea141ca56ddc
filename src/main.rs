//! AgentDock CLI — run the registry API and manage its configuration.

use agentdock_core::config::AgentDockConfig;
use agentdock_platform::AuthGate;
use agentdock_platform::auth::hash_password;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agentdock", version, about = "AgentDock tenant & agent registry")]
struct Cli {
    /// Config file (defaults to $AGENTDOCK_CONFIG or ~/.agentdock/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registry API server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Mint a bearer token with the configured secret
    Token {
        #[arg(long)]
        sub: String,
        #[arg(long = "role", default_value = "admin")]
        roles: Vec<String>,
    },
    /// Print a bcrypt hash for `auth.admin_password_hash`
    HashPassword { password: String },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config_path = cli.config.clone().unwrap_or_else(AgentDockConfig::resolve_path);

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = AgentDockConfig::load_or_default(&config_path)?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            tracing::info!("🚀 AgentDock v{} starting", env!("CARGO_PKG_VERSION"));
            agentdock_gateway::start(&config).await?;
        }
        Commands::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", config_path.display());
            }
            AgentDockConfig::default().save_to(&config_path)?;
            println!("✅ Wrote {}", config_path.display());
        }
        Commands::Token { sub, roles } => {
            let config = AgentDockConfig::load_or_default(&config_path)?;
            let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
            let issued = AuthGate::from_config(&config.auth)?.sign(&sub, &roles)?;
            println!("{}", serde_json::to_string_pretty(&issued)?);
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["agentdock", "serve", "--port", "9090", "--log-json"]).unwrap();
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9090), host: None }));
    }

    #[test]
    fn test_token_roles_default_to_admin() {
        let cli = Cli::try_parse_from(["agentdock", "token", "--sub", "ops@acme.io"]).unwrap();
        let Commands::Token { roles, .. } = cli.command else { panic!("expected token command") };
        assert_eq!(roles, ["admin"]);
    }
}
