//! CLI definition and dispatch.

use anyhow::Result;
use botline_core::ServerConfig;
use clap::{Parser, Subcommand};

/// Environment variables check-env reports on: (name, required)
const ENV_VARS: &[(&str, bool)] = &[
    ("OPENAI_API_KEY", true),
    ("OPENAI_MODEL", false),
    ("BOTLINE_DB_PATH", false),
    ("BOTLINE_API_TOKEN", false),
    ("BOTLINE_HOST", false),
    ("BOTLINE_PORT", false),
];

#[derive(Debug, Parser)]
#[command(name = "botline", version, about = "WhatsApp chatbot backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Report which configuration variables are set
    CheckEnv,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::CheckEnv) => {
            check_env();
            Ok(())
        }
        Some(Command::Serve { port }) => serve(port).await,
        None => serve(None).await,
    }
}

async fn serve(port: Option<u16>) -> Result<()> {
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    crate::server::run(config).await
}

fn check_env() {
    println!("Checking environment variables...");
    for &(name, required) in ENV_VARS {
        let tag = if required { "required" } else { "optional" };
        match std::env::var(name) {
            Ok(_) => println!("  {name}: set ({tag})"),
            Err(_) => println!("  {name}: missing ({tag})"),
        }
    }
}
