use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the configuration the server would start with (secrets omitted)")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = config::config();
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                OutputFormat::Text => {
                    println!("Environment: {:?}", config.environment);
                    println!("Store: {:?}", config.database.backend);
                    println!("Database URL set: {}", config.database.url.is_some());
                    println!("Port: {}", config.api.port);
                    println!("CORS origins: {}", config.security.cors_origins.join(", "));
                    println!("Token lifetime: {}h", config.security.jwt_expiry_hours);
                    println!("Max trip days: {}", config.plan.max_trip_days);
                }
            }
            Ok(())
        }
    }
}
