use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::utils::{output_school_list, output_success, read_json_input, school_details};
use crate::cli::OutputFormat;
use crate::client::{ListOptions, SchoolsClient};

#[derive(Subcommand)]
pub enum SchoolCommands {
    #[command(about = "List schools visible to the current token")]
    List {
        #[arg(long, help = "Page number (enables the paged envelope)")]
        page: Option<u32>,
        #[arg(long, help = "Rows per page")]
        page_size: Option<u32>,
        #[arg(long, help = "Listing-card projection instead of full records")]
        lightweight: bool,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        district: Option<String>,
        #[arg(long, help = "Case-insensitive name search")]
        search: Option<String>,
    },

    #[command(about = "Show one school with every relation")]
    Get {
        #[arg(help = "School ID")]
        id: i64,
    },

    #[command(about = "Create a school from a JSON file or stdin")]
    Create {
        #[arg(long, help = "JSON file (defaults to stdin)")]
        file: Option<PathBuf>,
    },

    #[command(about = "Update a school from a JSON file or stdin")]
    Update {
        #[arg(help = "School ID")]
        id: i64,
        #[arg(long, help = "JSON file (defaults to stdin)")]
        file: Option<PathBuf>,
    },

    #[command(about = "Delete a school and everything attached to it")]
    Delete {
        #[arg(help = "School ID")]
        id: i64,
    },
}

pub async fn handle(
    cmd: SchoolCommands,
    client: &SchoolsClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        SchoolCommands::List {
            page,
            page_size,
            lightweight,
            city,
            district,
            search,
        } => {
            let options = ListOptions {
                page,
                page_size,
                lightweight,
                city,
                district,
                search,
            };
            let body = client.list_schools(&options).await?;
            output_school_list(output_format, &body)
        }
        SchoolCommands::Get { id } => {
            let school = client.get_school(id).await?;
            show(output_format, &school)
        }
        SchoolCommands::Create { file } => {
            let body = read_json_input(file.as_deref())?;
            let school = client.create_school(&body).await?;
            output_success(
                output_format,
                &format!("Created school {}", school["id"]),
                school,
            )
        }
        SchoolCommands::Update { id, file } => {
            let body = read_json_input(file.as_deref())?;
            let school = client.update_school(id, &body).await?;
            show(output_format, &school)
        }
        SchoolCommands::Delete { id } => {
            let school = client.delete_school(id).await?;
            output_success(output_format, &format!("Deleted school {}", id), school)
        }
    }
}

fn show(output_format: OutputFormat, school: &serde_json::Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(school)?),
        OutputFormat::Text => println!("{}", school_details(school)),
    }
    Ok(())
}
