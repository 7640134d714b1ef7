pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::SchoolsClient;

#[derive(Parser)]
#[command(name = "schools")]
#[command(about = "Command-line client for the school directory API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "SCHOOLS_API_URL",
        default_value = "http://localhost:3001",
        help = "API base URL"
    )]
    pub url: String,

    #[arg(long, global = true, env = "SCHOOLS_TOKEN", hide_env_values = true, help = "Bearer token")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check API and database health")]
    Health,

    #[command(about = "Show the account behind the current token")]
    Whoami,

    #[command(about = "List, show and edit schools")]
    Schools {
        #[command(subcommand)]
        cmd: commands::schools::SchoolCommands,
    },

    #[command(about = "Attach photos and videos")]
    Media {
        #[command(subcommand)]
        cmd: commands::media::MediaCommands,
    },

    #[command(about = "Provision staff accounts (admin only)")]
    Employee {
        #[command(subcommand)]
        cmd: commands::employee::EmployeeCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = SchoolsClient::new(&cli.url, cli.token.clone())?;

    match cli.command {
        Commands::Health => commands::session::health(&client, output_format).await,
        Commands::Whoami => commands::session::whoami(&client, output_format).await,
        Commands::Schools { cmd } => commands::schools::handle(cmd, &client, output_format).await,
        Commands::Media { cmd } => commands::media::handle(cmd, &client, output_format).await,
        Commands::Employee { cmd } => commands::employee::handle(cmd, &client, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_commands_and_globals() {
        let cli = Cli::try_parse_from([
            "schools", "--json", "--token", "abc", "schools", "list", "--page", "2", "--city", "Tbilisi",
        ])
        .unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        assert_eq!(cli.token.as_deref(), Some("abc"));
        match cli.command {
            Commands::Schools {
                cmd: commands::schools::SchoolCommands::List { page, city, .. },
            } => {
                assert_eq!(page, Some(2));
                assert_eq!(city.as_deref(), Some("Tbilisi"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn employee_role_is_restricted() {
        assert!(Cli::try_parse_from([
            "schools", "employee", "create", "--email", "a@b.ge", "--password", "secret1", "--role", "janitor",
        ])
        .is_err());
    }
}
