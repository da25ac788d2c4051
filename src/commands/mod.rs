//! CLI subcommands for operations tasks

use crate::database::Database;
use crate::jobs::{ExpiryWarningsJob, Job, MonthlyResetJob, TokenExpiryJob};
use crate::ledger::TokenLedger;
use crate::Config;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Run database migrations and exit
    Migrate,
    /// Zero expired subscription token pools
    SweepTokens,
    /// Send expiry warnings for tokens expiring soon
    WarnExpiring,
    /// Reset all users' monthly generation counters
    ResetUsage,
}

pub async fn handle_command(
    command: Commands,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let database = Database::connect(&config.database.url).await?;

    match command {
        Commands::Migrate => {
            database.migrate().await?;
            info!("Migrations complete");
        }
        Commands::SweepTokens => {
            database.migrate().await?;
            let job = TokenExpiryJob::new(TokenLedger::new(database.token_balances()));
            let result = job.execute().await?;
            info!("Sweep complete: {}", result.message);
        }
        Commands::WarnExpiring => {
            database.migrate().await?;
            let job = ExpiryWarningsJob::new(
                TokenLedger::new(database.token_balances()),
                config.jobs.expiry_warnings.horizon_days,
            );
            let result = job.execute().await?;
            info!("Warning sweep complete: {}", result.message);
        }
        Commands::ResetUsage => {
            database.migrate().await?;
            let job = MonthlyResetJob::new(database.users());
            let result = job.execute().await?;
            info!("Usage reset complete: {}", result.message);
        }
    }

    Ok(())
}
