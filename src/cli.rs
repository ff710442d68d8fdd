//! Command-line surface for the `safeline` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::warn;

use crate::app::AppState;
use crate::backend::{AuthError, ClientBuildError};
use crate::config::ConfigError;
use crate::console::{Console, SessionEnd};
use crate::error::ErrorCode;
use crate::state::SignUpNotice;
use crate::wizard::SequenceError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("missing credentials; pass --email/--password or set SAFELINE_EMAIL and SAFELINE_PASSWORD")]
    MissingCredentials,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Client(#[from] ClientBuildError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "safeline", about = "Emergency assistance from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    #[arg(long, env = "SAFELINE_EMAIL")]
    pub email: Option<String>,

    #[arg(long, env = "SAFELINE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl CredentialArgs {
    fn pair(&self) -> Result<(&str, &str), CliError> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(CliError::MissingCredentials),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct MediaArgs {
    #[arg(long, help = "Audio file replayed as the microphone")]
    pub audio: Option<PathBuf>,

    #[arg(long, help = "Image file shown as the camera")]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    SignIn(CredentialArgs),
    SignUp(CredentialArgs),
    SignOut,
    Whoami,
    /// Walk through the emergency process.
    Sos(MediaArgs),
}

impl Command {
    /// Device sources the command needs wired into the app.
    #[must_use]
    pub fn media(&self) -> MediaArgs {
        match self {
            Self::Sos(media) => media.clone(),
            Self::SignIn(_) | Self::SignUp(_) | Self::SignOut | Self::Whoami => MediaArgs::default(),
        }
    }
}

/// Run one command against a restored app.
///
/// # Errors
///
/// Auth failures from sign-in/sign-up and terminal I/O errors.
pub async fn run(command: Command, app: &mut AppState) -> Result<(), CliError> {
    match command {
        Command::SignIn(creds) => {
            let (email, password) = creds.pair()?;
            let user = app.auth.sign_in(email, password).await?;
            println!("Signed in as {}", user.email.as_deref().unwrap_or("unknown"));
            Ok(())
        }
        Command::SignUp(creds) => {
            let (email, password) = creds.pair()?;
            match app.auth.sign_up(email, password).await? {
                SignUpNotice::SignedIn => println!("Account created; you are signed in"),
                notice @ SignUpNotice::CheckEmail => {
                    println!("{}", notice.message().unwrap_or_default());
                }
            }
            Ok(())
        }
        Command::SignOut => {
            if let Err(e) = app.auth.sign_out().await {
                warn!(error = %e, code = e.error_code(), "sign-out incomplete");
            }
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => {
            match app.auth.user() {
                Some(user) => println!("{} ({})", user.email.as_deref().unwrap_or("no email"), user.id),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Command::Sos(_) => {
            let stdin = BufReader::new(tokio::io::stdin());
            sos(stdin, app).await
        }
    }
}

async fn sos<R>(input: R, app: &mut AppState) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut console = Console::new(input, std::io::stdout());
    match console.run_emergency(app).await? {
        SessionEnd::Settled | SessionEnd::Quit => Ok(()),
        SessionEnd::SignInRequired => Err(CliError::Auth(AuthError::Unauthorized)),
    }
}
