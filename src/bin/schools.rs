use clap::Parser;
use school_directory_api::cli::utils::output_error;
use school_directory_api::cli::{Cli, OutputFormat};
use school_directory_api::client::ClientError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = school_directory_api::cli::run(cli).await {
        let code = match e.downcast_ref::<ClientError>() {
            Some(ClientError::Api { code, .. }) => Some(code.clone()),
            _ => None,
        };
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => output_error(output_format, &e.to_string(), code.as_deref())?,
        }
        std::process::exit(1);
    }

    Ok(())
}
