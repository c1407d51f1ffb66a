//! Maps each CLI command onto its handler.
//!
//! - `ls [path]` - browse one folder level
//! - `upload <files...> [--to path]` - sequential batch upload
//! - `download <path> [--output file]` - stream an object to disk
//! - `url <path>` - print a pre-signed GET URL
//! - `rm <path> [--yes]` - delete one object
//! - `grants` / `login` / `whoami` / `passwd` - identity and permissions
//! - `health` - server liveness

use crate::{
    config::{AppConfig, Command},
    handlers::{
        Console, browse_handlers, health_handlers, object_handlers, session_handlers,
        upload_handlers,
    },
};
use anyhow::Result;

pub async fn dispatch(cfg: AppConfig, command: Command) -> Result<()> {
    let console = Console::new(cfg)?;

    match command {
        Command::Ls { path } => browse_handlers::list(&console, &path).await,
        Command::Upload { files, to } => upload_handlers::upload(&console, &files, &to).await,
        Command::Download { path, output } => {
            object_handlers::download(&console, &path, output).await
        }
        Command::Url { path } => object_handlers::presigned_url(&console, &path).await,
        Command::Rm { path, yes } => object_handlers::remove(&console, &path, yes).await,
        Command::Grants => session_handlers::grants(&console).await,
        Command::Login {
            email,
            password_stdin,
        } => session_handlers::login(&console, &email, password_stdin).await,
        Command::Whoami => session_handlers::whoami(&console).await,
        Command::Passwd => session_handlers::change_password(&console).await,
        Command::Health => health_handlers::health(&console).await,
    }
}
