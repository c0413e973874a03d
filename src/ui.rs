// UI layer: the interactive bits of the importer. Kept apart from the
// pipeline so the import itself never touches the terminal directly.

use anyhow::{bail, Context, Result};
use dialoguer::Password;
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted before prompting for a password.
pub const PASSWORD_ENV: &str = "LEMMY_PASSWORD";

/// How long the password prompt waits for input.
pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Nobody answered the password prompt in time.
#[derive(Debug, Error)]
#[error("no password entered within {}s", .0.as_secs())]
pub struct PromptTimedOut(pub Duration);

/// Where the admin password comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    /// `LEMMY_PASSWORD` if set, otherwise ask on the terminal.
    EnvOrPrompt,
    /// `LEMMY_PASSWORD` only.
    EnvOnly,
}

impl PasswordSource {
    pub fn acquire(self, user: &str) -> Result<String> {
        if let Some(password) = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty()) {
            tracing::debug!("using password from {PASSWORD_ENV}");
            return Ok(password);
        }
        match self {
            PasswordSource::EnvOnly => bail!("{PASSWORD_ENV} is not set and prompting is disabled"),
            PasswordSource::EnvOrPrompt => prompt_password(user),
        }
    }

    /// [`acquire`](Self::acquire) off the runtime, giving up after
    /// [`PROMPT_TIMEOUT`].
    pub async fn acquire_async(self, user: String) -> Result<String> {
        acquire_with_timeout(move || self.acquire(&user), PROMPT_TIMEOUT).await
    }
}

/// Run a blocking password lookup on the blocking pool and wait at most
/// `timeout` for it. On timeout the error is a [`PromptTimedOut`]; the
/// blocking thread is left behind still waiting on the terminal.
pub async fn acquire_with_timeout<F>(acquire: F, timeout: Duration) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(acquire)).await {
        Ok(joined) => joined.context("password prompt panicked")?,
        Err(_) => Err(PromptTimedOut(timeout).into()),
    }
}

/// Ask for the password with hidden input.
fn prompt_password(user: &str) -> Result<String> {
    // `Password` hides input in terminal for passwords.
    Password::new()
        .with_prompt(format!("Password for {user}"))
        .interact()
        .context("failed to read password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unanswered_prompt_times_out() {
        let result = acquire_with_timeout(
            || {
                std::thread::sleep(Duration::from_millis(300));
                Ok("late".to_string())
            },
            Duration::from_millis(20),
        )
        .await;

        let error = result.unwrap_err();
        assert!(error.is::<PromptTimedOut>());
        assert_eq!(error.to_string(), "no password entered within 0s");
    }

    #[tokio::test]
    async fn answered_prompt_returns_password() {
        let password = acquire_with_timeout(|| Ok("hunter2".to_string()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(password, "hunter2");
    }

    #[tokio::test]
    async fn prompt_errors_pass_through() {
        let error = acquire_with_timeout(|| bail!("no tty"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(!error.is::<PromptTimedOut>());
        assert_eq!(error.to_string(), "no tty");
    }
}
