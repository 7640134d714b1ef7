use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::client::SchoolsClient;

#[derive(Subcommand)]
pub enum EmployeeCommands {
    #[command(about = "Create a confirmed staff account with a role")]
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SCHOOLS_EMPLOYEE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "employee", value_parser = ["employee", "admin"])]
        role: String,
    },
}

pub async fn handle(
    cmd: EmployeeCommands,
    client: &SchoolsClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        EmployeeCommands::Create { email, password, role } => {
            let created = client.create_employee(&email, &password, &role).await?;
            output_success(
                output_format,
                &format!(
                    "Created {} {} ({})",
                    role,
                    created["email"].as_str().unwrap_or(&email),
                    created["id"].as_str().unwrap_or("-")
                ),
                created,
            )
        }
    }
}
