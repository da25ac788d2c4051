//! Database access layer with domain-specific DAOs
//!
//! Each domain (users, token balances, payments, etc.) has its own DAO
//! for focused operations. Balance mutations are conditional updates at
//! this layer so application code never read-modify-writes token counts.

use sea_orm::DatabaseConnection;
use thiserror::Error;

pub mod dao;
pub mod entities;
pub mod migration;

pub use dao::{
    ApiKeysDao, CategoryEntry, DebitOutcome, DebitReceipt, EnhancementsDao, ExpiryWarning,
    GenerationsDao, PaymentsDao, TokenBalancesDao, UsersDao,
};

/// Database error types
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Record not found")]
    NotFound,
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Write contention: {0}")]
    Contention(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    pub async fn connect(url: &str) -> DatabaseResult<Self> {
        let connection = sea_orm::Database::connect(url)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(Self { connection })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DatabaseResult<()> {
        use crate::database::migration::Migrator;
        use sea_orm_migration::MigratorTrait;

        tracing::info!("Running database migrations");

        Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::Migration(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Successfully completed all migrations");
        Ok(())
    }

    /// Health check for database connection
    pub async fn health_check(&self) -> DatabaseResult<()> {
        self.connection
            .ping()
            .await
            .map_err(|e| DatabaseError::Database(format!("db error: {}", e)))
    }

    pub fn users(&self) -> UsersDao {
        UsersDao::new(self.connection.clone())
    }

    pub fn token_balances(&self) -> TokenBalancesDao {
        TokenBalancesDao::new(self.connection.clone())
    }

    pub fn enhancements(&self) -> EnhancementsDao {
        EnhancementsDao::new(self.connection.clone())
    }

    pub fn generations(&self) -> GenerationsDao {
        GenerationsDao::new(self.connection.clone())
    }

    pub fn payments(&self) -> PaymentsDao {
        PaymentsDao::new(self.connection.clone())
    }

    pub fn api_keys(&self) -> ApiKeysDao {
        ApiKeysDao::new(self.connection.clone())
    }

    /// Direct connection (for migrations and admin operations)
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}
