use spotify_status_sync::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    spotify_status_sync::run(config).await
}
