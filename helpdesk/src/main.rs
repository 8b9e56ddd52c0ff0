mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use helpdesk_common::UserRole;
use logging::init_logging;

use crate::config::load_config;

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "helpdesk.yaml", action=ArgAction::Set)]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
pub(crate) enum Commands {
    /// Run the helpdesk server
    Run,
    /// Validate config file
    Check,
    /// Create a user with a given role
    CreateUser {
        #[clap(long)]
        email: String,
        #[clap(long)]
        name: String,
        /// USER, SUPPORT_AGENT, QUERY_RESOLVER or ADMIN
        #[clap(long, default_value = "ADMIN")]
        role: UserRole,
    },
    /// Create a password hash
    Hash,
}

async fn _main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(load_config(&cli.config, false).ok().as_ref())?;

    match &cli.command {
        Commands::Run => crate::commands::run::command(&cli).await,
        Commands::Check => crate::commands::check::command(&cli).await,
        Commands::CreateUser { email, name, role } => {
            crate::commands::create_user::command(&cli, email, name, *role).await
        }
        Commands::Hash => crate::commands::hash::command().await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(error) = _main().await {
        tracing::error!(?error, "Fatal error");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user_role(args: &[&str]) -> Option<UserRole> {
        let base = ["helpdesk", "create-user", "--email", "a@example.com", "--name", "Ann"];
        let cli = Cli::try_parse_from(base.iter().chain(args)).ok()?;
        match cli.command {
            Commands::CreateUser { role, .. } => Some(role),
            _ => None,
        }
    }

    #[test]
    fn parses_create_user_role() {
        assert_eq!(create_user_role(&[]), Some(UserRole::Admin));
        assert_eq!(create_user_role(&["--role", "support_agent"]), Some(UserRole::SupportAgent));
        assert_eq!(create_user_role(&["--role", "root"]), None);
    }
}
