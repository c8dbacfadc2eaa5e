use crate::db::CredentialStore;
use crate::db::models::ProviderCredential;
use crate::error::AppError;
use crate::spotify::client::SpotifyApi;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// What happened during one refresh pass. A failed user is retried next
/// cycle; the rest of the batch is unaffected.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failures: Vec<(String, AppError)>,
}

/// Keeps every user's Spotify access token valid by renewing credentials
/// that expire within the lookahead window.
pub struct TokenRefresher {
    store: Arc<dyn CredentialStore>,
    spotify: Arc<dyn SpotifyApi>,
    lookahead: Duration,
}

impl TokenRefresher {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        spotify: Arc<dyn SpotifyApi>,
        lookahead: Duration,
    ) -> Self {
        Self {
            store,
            spotify,
            lookahead,
        }
    }

    /// Refresh every credential expiring within the lookahead window.
    /// Individual failures are collected, never fatal to the pass.
    pub async fn run_once(&self) -> Result<RefreshReport, AppError> {
        let cutoff = Utc::now() + self.lookahead;
        let users = self.store.list_expiring_before(cutoff).await?;

        let mut report = RefreshReport::default();
        for user in users {
            match self.refresh_user(&user).await {
                Ok(()) => report.refreshed += 1,
                Err(err) => {
                    tracing::warn!(user_id = %user, error = %err, "Token refresh failed for user");
                    report.failures.push((user, err));
                }
            }
        }

        Ok(report)
    }

    async fn refresh_user(&self, user_id: &str) -> Result<(), AppError> {
        let Some(credential) = self.store.get_credential(user_id).await? else {
            // Disconnected between the listing and now.
            return Ok(());
        };

        let grant = self
            .spotify
            .exchange_token(&credential.refresh_token, true)
            .await?;

        // Spotify rotates refresh tokens optionally; keep the stored one
        // when the response omits a replacement.
        let refresh_token = grant
            .refresh_token
            .unwrap_or_else(|| credential.refresh_token.clone());

        let updated = ProviderCredential {
            spotify_id: credential.spotify_id,
            access_token: grant.access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(grant.expires_in_seconds),
        };

        self.store.upsert_credential(user_id, &updated).await?;

        tracing::debug!(
            user_id = user_id,
            expires_at = %updated.expires_at,
            "Refreshed Spotify credential"
        );
        Ok(())
    }
}
