use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The status fields of a Slack profile, as returned by
/// `users.profile.get` and written by `users.profile.set`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackProfile {
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub status_emoji: String,
    #[serde(default)]
    pub status_expiration: i64,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    ok: bool,
    profile: Option<SlackProfile>,
    error: Option<String>,
}

/// Slack as the sync engine sees it: a live profile read and an
/// idempotent profile write. A revoked user token surfaces as
/// `SlackTokenRevoked`, never as a generic API error.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn get_profile(&self, token: &str, user_id: &str) -> Result<SlackProfile, AppError>;

    async fn set_profile(&self, token: &str, profile: &SlackProfile) -> Result<(), AppError>;
}

pub struct HttpSlackClient {
    http: reqwest::Client,
    api_url: String,
}

impl HttpSlackClient {
    pub fn new(api_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
        }
    }

    /// Slack reports failures in the body with `ok: false`; HTTP status
    /// is 200 either way, so both calls share this decode path.
    fn unwrap_response(
        &self,
        response: ProfileResponse,
        endpoint: &str,
    ) -> Result<Option<SlackProfile>, AppError> {
        if !response.ok {
            let error = response.error.unwrap_or_else(|| "unknown error".to_string());
            if error == "token_revoked" {
                return Err(AppError::SlackTokenRevoked);
            }
            return Err(AppError::SlackApi(format!("{} failed: {}", endpoint, error)));
        }
        Ok(response.profile)
    }
}

#[async_trait]
impl SlackApi for HttpSlackClient {
    async fn get_profile(&self, token: &str, user_id: &str) -> Result<SlackProfile, AppError> {
        let response = self
            .http
            .get(format!("{}users.profile.get", self.api_url))
            .bearer_auth(token)
            .query(&[("user", user_id)])
            .send()
            .await
            .map_err(|e| AppError::SlackApi(format!("users.profile.get request failed: {}", e)))?
            .json::<ProfileResponse>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("users.profile.get payload: {}", e)))?;

        self.unwrap_response(response, "users.profile.get")?
            .ok_or_else(|| {
                AppError::MalformedResponse("users.profile.get returned no profile".to_string())
            })
    }

    async fn set_profile(&self, token: &str, profile: &SlackProfile) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}users.profile.set", self.api_url))
            .bearer_auth(token)
            .json(&json!({ "profile": profile }))
            .send()
            .await
            .map_err(|e| AppError::SlackApi(format!("users.profile.set request failed: {}", e)))?
            .json::<ProfileResponse>()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("users.profile.set payload: {}", e)))?;

        self.unwrap_response(response, "users.profile.set")?;
        Ok(())
    }
}
