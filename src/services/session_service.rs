//! Authenticated session: cached current user, password changes and token
//! expiry.

use crate::{
    errors::{ConsoleError, ConsoleResult},
    interfaces::SessionApi,
    models::session::{AccessToken, CurrentUser},
};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Remaining lifetime (seconds) below which the CLI warns that the session
/// is ending.
pub const EXPIRY_WARNING_SECS: i64 = 120;

pub struct SessionService {
    api: Arc<dyn SessionApi>,
    cached: Option<CurrentUser>,
}

impl SessionService {
    pub fn new(api: Arc<dyn SessionApi>) -> Self {
        Self { api, cached: None }
    }

    pub fn cached_user(&self) -> Option<&CurrentUser> {
        self.cached.as_ref()
    }

    /// Exchange credentials for a token. Any cached user belongs to the
    /// previous identity and is dropped.
    pub async fn login(&mut self, email: &str, password: &str) -> ConsoleResult<AccessToken> {
        self.cached = None;
        let token = self.api.login(email, password).await?;
        info!("logged in as {}", email);
        Ok(token)
    }

    /// Cached user, fetched on first use.
    pub async fn current_user(&mut self) -> ConsoleResult<&CurrentUser> {
        if self.cached.is_none() {
            return self.refresh_current_user().await;
        }
        self.cached.as_ref().ok_or(ConsoleError::Unauthorized)
    }

    /// Always re-read the user from the server.
    pub async fn refresh_current_user(&mut self) -> ConsoleResult<&CurrentUser> {
        let user = self.api.current_user().await?;
        debug!("refreshed user {} (admin: {})", user.email, user.is_admin);
        Ok(&*self.cached.insert(user))
    }

    /// Change the password, then re-read the user so a cleared
    /// `must_change_password` flag is observed immediately.
    pub async fn change_password(
        &mut self,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> ConsoleResult<&CurrentUser> {
        validate_new_password(new_password, confirmation)?;
        self.api
            .change_password(current_password, new_password)
            .await?;
        self.cached = None;
        info!("password updated");
        self.refresh_current_user().await
    }
}

pub fn validate_new_password(new_password: &str, confirmation: &str) -> ConsoleResult<()> {
    if new_password != confirmation {
        return Err(ConsoleError::InvalidPassword("New passwords don't match"));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ConsoleError::InvalidPassword(
            "Password must be at least 8 characters long",
        ));
    }
    Ok(())
}

/// `exp` claim of a JWT bearer token. `None` for opaque or malformed tokens;
/// the signature is not checked, the server does that.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

/// Time left before `token` expires, if it carries an expiry.
pub fn remaining_lifetime(token: &str, now: DateTime<Utc>) -> Option<Duration> {
    token_expiry(token).map(|exp| exp - now)
}
