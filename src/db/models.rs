use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A linked Spotify credential. One-to-one with a Slack account row,
/// which itself carries the user's Slack token and the last-applied
/// status string.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub spotify_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}
