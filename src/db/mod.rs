pub mod memory;
pub mod models;
pub mod repository;

use crate::db::models::ProviderCredential;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Persistence contract for the sync engine and the token refresher.
///
/// The engine never caches tokens across cycles; it re-reads through this
/// interface on every tick, so refreshed tokens are picked up without any
/// coordination between the two schedulers.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Users with both a linked Spotify credential and a Slack token.
    async fn list_connected_users(&self) -> Result<Vec<String>, AppError>;

    /// Users whose Spotify credential expires at or before `cutoff`.
    async fn list_expiring_before(&self, cutoff: DateTime<Utc>)
    -> Result<Vec<String>, AppError>;

    async fn get_credential(&self, user_id: &str)
    -> Result<Option<ProviderCredential>, AppError>;

    /// Writes the credential and links it to the user's account. At most
    /// one live credential exists per provider-account id.
    async fn upsert_credential(
        &self,
        user_id: &str,
        credential: &ProviderCredential,
    ) -> Result<(), AppError>;

    async fn get_slack_token(&self, user_id: &str) -> Result<Option<String>, AppError>;

    async fn get_last_status(&self, user_id: &str) -> Result<Option<String>, AppError>;

    async fn set_last_status(&self, user_id: &str, status: &str) -> Result<(), AppError>;

    /// Full teardown: credential, last-applied status and the account
    /// record itself. Used when a provider reports revocation.
    async fn delete_all_data(&self, user_id: &str) -> Result<(), AppError>;
}

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    tracing::info!("Initializing database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}
