//! Identity commands: `login`, `whoami`, `passwd` and `grants`.

use super::{
    Console,
    output::{GrantsOutput, UserOutput, print_output, print_success},
    prompt, prompt_lines, report,
};
use crate::services::session_service::{
    EXPIRY_WARNING_SECS, SessionService, remaining_lifetime, token_expiry,
};
use anyhow::{Result, bail};
use chrono::Utc;
use tracing::warn;

fn session(console: &Console) -> SessionService {
    SessionService::new(console.client.clone())
}

/// `s3-console login --email <e> [--password-stdin]`
///
/// Prints the token for the caller to export as `S3_CONSOLE_TOKEN`.
pub async fn login(console: &Console, email: &str, password_stdin: bool) -> Result<()> {
    let password = if password_stdin {
        prompt("").await?
    } else {
        prompt("Password: ").await?
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let token = session(console)
        .login(email, &password)
        .await
        .map_err(report)?;
    let expires_at = token_expiry(&token.access_token);

    if console.cfg.json {
        println!(
            "{}",
            serde_json::json!({
                "access_token": token.access_token,
                "token_type": token.token_type,
                "expires_at": expires_at,
            })
        );
    } else {
        println!("export S3_CONSOLE_TOKEN={}", token.access_token);
        if let Some(exp) = expires_at {
            eprintln!("Token expires at {}", exp.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    Ok(())
}

/// `s3-console whoami`
pub async fn whoami(console: &Console) -> Result<()> {
    let mut session = session(console);
    let user = session.current_user().await.map_err(report)?.clone();

    let token = console.cfg.token.as_deref().unwrap_or_default();
    if let Some(left) = remaining_lifetime(token, Utc::now()) {
        if left.num_seconds() <= 0 {
            warn!("session token has expired");
        } else if left.num_seconds() < EXPIRY_WARNING_SECS {
            warn!(
                "session expires in {} second(s), log in again soon",
                left.num_seconds()
            );
        }
    }

    print_output(
        &UserOutput {
            user,
            expires_at: token_expiry(token),
        },
        console.cfg.json,
    );
    Ok(())
}

/// `s3-console passwd`
///
/// Reads the current password, the new one and its confirmation from stdin.
pub async fn change_password(console: &Console) -> Result<()> {
    let answers = prompt_lines(&[
        "Current password: ",
        "New password: ",
        "Confirm new password: ",
    ])
    .await?;
    let [current, new, confirm] = answers.as_slice() else {
        bail!("expected three password lines");
    };

    let mut session = session(console);
    let user = session
        .change_password(current, new, confirm)
        .await
        .map_err(report)?;
    if user.must_change_password {
        warn!("server still requires a password change for {}", user.email);
    }
    print_success("Password updated successfully", console.cfg.json);
    Ok(())
}

/// `s3-console grants`
pub async fn grants(console: &Console) -> Result<()> {
    let grants = console.client.my_grants().await.map_err(report)?;
    print_output(&GrantsOutput(grants), console.cfg.json);
    Ok(())
}
