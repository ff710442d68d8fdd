use clap::Parser;
use safeline::app::AppState;
use safeline::cli::{self, Cli, CliError};
use safeline::config::AppConfig;
use safeline::error::ErrorCode;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Cli::parse();
    let config = AppConfig::from_env()?;
    let media = args.command.media();
    let mut app = AppState::from_config(&config, media.audio, media.image)?;

    if let Err(e) = app.auth.restore().await {
        tracing::warn!(error = %e, code = e.error_code(), "session restore incomplete");
    }

    cli::run(args.command, &mut app).await
}
