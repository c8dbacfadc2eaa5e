use crate::config::Config;
use crate::error::AppError;
use crate::spotify::models::{CurrentlyPlayingResponse, PlaybackSnapshot};
use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicErrorResponseType};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, RefreshToken,
    RequestTokenError, TokenResponse, TokenUrl,
};
use reqwest::StatusCode;

/// Result of a token grant (authorization code or refresh). Spotify may
/// rotate the refresh token optionally; `refresh_token` is `None` when it
/// did not.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in_seconds: i64,
}

/// Spotify as the sync engine sees it: token grants plus the playback
/// read. `SpotifyUnauthorized` is always distinct from transport errors.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Exchange an authorization code (`is_refresh = false`) or a refresh
    /// token (`is_refresh = true`) for a new access/refresh pair.
    async fn exchange_token(
        &self,
        code_or_refresh: &str,
        is_refresh: bool,
    ) -> Result<TokenGrant, AppError>;

    /// Fetch the playback snapshot. `Ok(None)` means not playing (the
    /// provider's no-content response), never an error.
    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<PlaybackSnapshot>, AppError>;
}

pub struct HttpSpotifyClient {
    oauth_client: BasicClient,
    http: reqwest::Client,
    api_url: String,
}

impl HttpSpotifyClient {
    pub fn new(config: &Config, http: reqwest::Client) -> anyhow::Result<Self> {
        let mut oauth_client = BasicClient::new(
            ClientId::new(config.spotify_client_id.clone()),
            Some(ClientSecret::new(config.spotify_client_secret.clone())),
            AuthUrl::new(format!("{}authorize", config.spotify_auth_url))?,
            Some(TokenUrl::new(format!("{}api/token", config.spotify_auth_url))?),
        );

        if let Some(redirect_uri) = &config.spotify_redirect_uri {
            oauth_client = oauth_client.set_redirect_uri(RedirectUrl::new(redirect_uri.clone())?);
        }

        Ok(Self {
            oauth_client,
            http,
            api_url: config.spotify_api_url.clone(),
        })
    }
}

#[async_trait]
impl SpotifyApi for HttpSpotifyClient {
    async fn exchange_token(
        &self,
        code_or_refresh: &str,
        is_refresh: bool,
    ) -> Result<TokenGrant, AppError> {
        let token_result = if is_refresh {
            self.oauth_client
                .exchange_refresh_token(&RefreshToken::new(code_or_refresh.to_string()))
                .request_async(async_http_client)
                .await
        } else {
            self.oauth_client
                .exchange_code(AuthorizationCode::new(code_or_refresh.to_string()))
                .request_async(async_http_client)
                .await
        };

        let token_result = token_result.map_err(|e| match &e {
            RequestTokenError::ServerResponse(response)
                if matches!(response.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                AppError::SpotifyUnauthorized
            }
            _ => AppError::SpotifyApi(format!("Token exchange failed: {}", e)),
        })?;

        let expires_in_seconds = token_result
            .expires_in()
            .ok_or_else(|| {
                AppError::MalformedResponse("No expires_in in token response".to_string())
            })?
            .as_secs() as i64;

        Ok(TokenGrant {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string()),
            expires_in_seconds,
        })
    }

    async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<PlaybackSnapshot>, AppError> {
        let response = self
            .http
            .get(format!("{}me/player/currently-playing", self.api_url))
            .bearer_auth(access_token)
            .query(&[("additional_types", "track,episode")])
            .send()
            .await
            .map_err(|e| AppError::SpotifyApi(format!("currently-playing request failed: {}", e)))?;

        match response.status() {
            // Not playing, or a private session.
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::UNAUTHORIZED => Err(AppError::SpotifyUnauthorized),
            status if status.is_success() => {
                let payload = response.json::<CurrentlyPlayingResponse>().await.map_err(
                    |e| AppError::MalformedResponse(format!("currently-playing payload: {}", e)),
                )?;
                Ok(payload.into_snapshot())
            }
            status => Err(AppError::SpotifyApi(format!(
                "Non-200/204 status code from currently-playing endpoint: {}",
                status
            ))),
        }
    }
}
