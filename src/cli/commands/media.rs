use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::utils::{output_success, read_json_input};
use crate::cli::OutputFormat;
use crate::client::SchoolsClient;

#[derive(Subcommand)]
pub enum MediaCommands {
    #[command(about = "Insert a JSON array of media items from a file or stdin")]
    Add {
        #[arg(long, help = "JSON file (defaults to stdin)")]
        file: Option<PathBuf>,
    },
}

pub async fn handle(
    cmd: MediaCommands,
    client: &SchoolsClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        MediaCommands::Add { file } => {
            let items = read_json_input(file.as_deref())?;
            if !items.is_array() {
                anyhow::bail!("media input must be a JSON array");
            }
            let inserted = client.add_media(&items).await?;
            let count = inserted.as_array().map(Vec::len).unwrap_or_default();
            output_success(output_format, &format!("Inserted {} media item(s)", count), inserted)
        }
    }
}
