use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, validate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token for a user")]
    Issue {
        #[arg(long, help = "User id (UUID) carried in the token")]
        user_id: Uuid,
        #[arg(long, help = "Username carried in the token")]
        username: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Validate a token and show its claims")]
    Inspect {
        #[arg(help = "Encoded JWT")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;

    match cmd {
        TokenCommands::Issue { user_id, username, hours } => {
            let hours = hours.unwrap_or(security.jwt_expiry_hours);
            let claims = Claims::new(user_id, username, hours);
            let token = generate_jwt(&claims, &security.jwt_secret)?;

            match output_format {
                OutputFormat::Text => println!("{}", token),
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp })),
                )?,
            }
            Ok(())
        }
        TokenCommands::Inspect { token } => {
            let claims = validate_jwt(&token, &security.jwt_secret)?;
            output_success(
                &output_format,
                &format!("Token valid for {} ({})", claims.username, claims.user_id),
                Some(json!({ "claims": claims })),
            )
        }
    }
}
