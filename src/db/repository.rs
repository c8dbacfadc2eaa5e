use crate::db::CredentialStore;
use crate::db::models::ProviderCredential;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Postgres-backed credential store.
///
/// Queries are runtime-checked so the crate builds without a live
/// database. Per-row writes are atomic, which is the only property the
/// two schedulers rely on when sharing the store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn list_connected_users(&self) -> Result<Vec<String>, AppError> {
        let users = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM slack_accounts
            WHERE access_token IS NOT NULL AND spotify_id IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        let users = sqlx::query_scalar::<_, String>(
            r#"
            SELECT s.id
            FROM slack_accounts s
            JOIN spotify_accounts p ON s.spotify_id = p.id
            WHERE p.expires_at <= $1
            ORDER BY p.expires_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_credential(
        &self,
        user_id: &str,
    ) -> Result<Option<ProviderCredential>, AppError> {
        let credential = sqlx::query_as::<_, ProviderCredential>(
            r#"
            SELECT p.id AS spotify_id, p.access_token, p.refresh_token, p.expires_at
            FROM slack_accounts s
            JOIN spotify_accounts p ON s.spotify_id = p.id
            WHERE s.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn upsert_credential(
        &self,
        user_id: &str,
        credential: &ProviderCredential,
    ) -> Result<(), AppError> {
        // Transactional so a credential row is never left dangling
        // without its account link.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO spotify_accounts (id, access_token, refresh_token, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&credential.spotify_id)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expires_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE slack_accounts SET spotify_id = $1 WHERE id = $2
            "#,
        )
        .bind(&credential.spotify_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        // The account row is created by the connect flow; a credential
        // for an unknown user is a bug, not something to paper over.
        if result.rows_affected() == 0 {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }

        tx.commit().await?;

        Ok(())
    }

    async fn get_slack_token(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let token = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT access_token FROM slack_accounts WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        Ok(token)
    }

    async fn get_last_status(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let status = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT status FROM slack_accounts WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        Ok(status)
    }

    async fn set_last_status(&self, user_id: &str, status: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE slack_accounts SET status = $1 WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_all_data(&self, user_id: &str) -> Result<(), AppError> {
        let spotify_id = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT spotify_id FROM slack_accounts WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        sqlx::query("DELETE FROM slack_accounts WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if let Some(spotify_id) = spotify_id {
            sqlx::query("DELETE FROM spotify_accounts WHERE id = $1")
                .bind(&spotify_id)
                .execute(&self.pool)
                .await?;
        }

        tracing::info!(user_id = user_id, "Deleted all stored data for user");

        Ok(())
    }
}
