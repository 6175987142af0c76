use linkgrab::{Config, telegram};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> linkgrab::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {}", e);
    }

    let config = Config::from_env()?;
    config.validate()?;
    config.require_bot_token()?;

    tokio::fs::create_dir_all(config.download_dir()).await?;
    info!(download_dir = ?config.download_dir(), "download directory ready");

    if let Err(e) = telegram::run(config).await {
        error!(error = %e, "bot exited with error");
        return Err(e);
    }
    Ok(())
}
