use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,

    pub spotify_client_id: String,
    pub spotify_client_secret: String,

    // Only needed when exchanging an initial authorization code; pure
    // refresh deployments can leave it unset.
    pub spotify_redirect_uri: Option<String>,

    #[serde(default = "default_spotify_auth_url")]
    pub spotify_auth_url: String,

    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,

    #[serde(default = "default_slack_api_url")]
    pub slack_api_url: String,

    /// Cadence of the status reconciliation loop.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Cadence of the token refresh loop.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Tokens expiring within this window get refreshed. Must exceed the
    /// sync interval plus expected provider latency so a token never
    /// expires mid-cycle.
    #[serde(default = "default_refresh_lookahead_mins")]
    pub refresh_lookahead_mins: i64,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_rust_log")]
    pub rust_log: String,
}

fn default_spotify_auth_url() -> String {
    "https://accounts.spotify.com/".to_string()
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com/v1/".to_string()
}

fn default_slack_api_url() -> String {
    "https://slack.com/api/".to_string()
}

fn default_sync_interval_secs() -> u64 {
    5
}

fn default_refresh_interval_secs() -> u64 {
    15 * 60
}

fn default_refresh_lookahead_mins() -> i64 {
    20
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_rust_log() -> String {
    "info,spotify_status_sync=debug".to_string()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
