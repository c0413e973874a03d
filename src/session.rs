// Session authenticator: exchanges admin credentials for a bearer token
// once per import run. The token lives only in memory for the duration of
// the run; there is no refresh and no logout.

use crate::api::{ApiError, LemmyApi, LoginRequest};
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid Lemmy URL `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("login request failed: {0}")]
    TransportFailure(#[source] ApiError),

    #[error("credentials are valid but the login response did not contain a token")]
    NoToken,
}

/// Username (or email) and password of the account posts are created as.
#[derive(Clone)]
pub struct Credentials {
    pub username_or_email: String,
    password: String,
}

impl Credentials {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username_or_email", &self.username_or_email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated context for one import run.
#[derive(Clone)]
pub struct Session {
    token: String,
    base_url: Url,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The instance this session was issued by.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Parse and check the instance URL. Only http(s) endpoints without a query
/// or fragment are accepted, since API paths are appended to it.
pub fn parse_endpoint(base_url: &str) -> Result<Url, AuthError> {
    let invalid = |reason: String| AuthError::InvalidEndpoint {
        url: base_url.to_string(),
        reason,
    };
    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed".into()));
    }
    Ok(url)
}

/// Build a transport for `base_url` with `connect` and log in once.
///
/// A malformed URL fails before `connect` is called. The transport is
/// handed back alongside the session so the caller can keep using it.
pub async fn authenticate<A, C>(
    connect: C,
    base_url: &str,
    credentials: &Credentials,
) -> Result<(A, Session), AuthError>
where
    A: LemmyApi,
    C: FnOnce(Url) -> Result<A, ApiError>,
{
    let url = parse_endpoint(base_url)?;
    let api = connect(url.clone()).map_err(AuthError::TransportFailure)?;
    let session = login(&api, url, credentials).await?;
    Ok((api, session))
}

/// Log in against an already constructed transport.
pub async fn login<A: LemmyApi + ?Sized>(
    api: &A,
    base_url: Url,
    credentials: &Credentials,
) -> Result<Session, AuthError> {
    let request = LoginRequest {
        username_or_email: &credentials.username_or_email,
        password: credentials.password(),
    };
    let response = api
        .login(&request)
        .await
        .map_err(AuthError::TransportFailure)?;

    match response.jwt {
        Some(token) if !token.is_empty() => {
            tracing::info!(user = %credentials.username_or_email, instance = %base_url, "logged in");
            Ok(Session { token, base_url })
        }
        _ => Err(AuthError::NoToken),
    }
}

#[cfg(test)]
pub(crate) fn test_session(token: &str) -> Session {
    Session {
        token: token.to_string(),
        base_url: Url::parse("https://lemmy.test").unwrap(),
    }
}
