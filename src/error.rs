use thiserror::Error;

/// Application-specific errors.
///
/// The revocation variants are load-bearing: the sync engine matches on
/// them to tear an account down instead of retrying, so provider clients
/// must never fold them into the generic API variants.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Spotify API error: {0}")]
    SpotifyApi(String),

    /// Spotify reported the credential invalid or revoked.
    #[error("Spotify authorization revoked")]
    SpotifyUnauthorized,

    #[error("Slack API error: {0}")]
    SlackApi(String),

    /// Slack reported the user token revoked.
    #[error("Slack token revoked")]
    SlackTokenRevoked,

    /// Unexpected payload shape from a provider. Fatal for the affected
    /// user for this cycle; no status is written.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the error means "this account is gone", not "try again
    /// next tick".
    pub fn is_revocation(&self) -> bool {
        matches!(
            self,
            AppError::SpotifyUnauthorized | AppError::SlackTokenRevoked
        )
    }
}
