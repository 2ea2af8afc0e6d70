use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{self, StoreBackend};
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending migrations")]
    Migrate,

    #[command(about = "Check that the database answers")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config::config().database;
    if database.backend == StoreBackend::Memory {
        anyhow::bail!("STORE_BACKEND is memory; nothing to do");
    }

    let pool = DatabaseManager::connect(database).await?;

    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate(&pool).await?;
            output_success(&output_format, "Migrations applied", None)
        }
        DbCommands::Ping => {
            DatabaseManager::health_check(&pool).await?;
            output_success(&output_format, "Database reachable", None)
        }
    }
}
