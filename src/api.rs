// API client module: a small async HTTP client for the Lemmy v3 API. Only
// the two calls the importer needs are wrapped: login and post creation.
// The `LemmyApi` trait is the seam the pipeline talks to, so tests can
// swap in an in-memory transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("bluuit-importer/", env!("CARGO_PKG_VERSION"));

/// Errors from a single call to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, timeout, TLS failure, client construction...
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status. The body is kept since
    /// Lemmy puts its error code there (e.g. `{"error":"incorrect_login"}`).
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// 2xx response whose body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Malformed(#[source] reqwest::Error),

    /// The bearer token contains characters not allowed in a header.
    #[error("token is not a valid header value")]
    InvalidToken,

    /// The base URL cannot have API paths appended to it.
    #[error("`{0}` cannot be used as a base URL")]
    InvalidBaseUrl(String),
}

/// Identifier of the Lemmy community posts are created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub i32);

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login request payload.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username_or_email: &'a str,
    pub password: &'a str,
}

/// Response of the login endpoint. `jwt` is absent when the account still
/// needs email verification or registration approval.
#[derive(Deserialize, Debug, Default)]
pub struct LoginResponse {
    pub jwt: Option<String>,
}

/// Create-post request payload.
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct CreatePost {
    pub name: String,
    pub community_id: CommunityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub body: String,
    pub nsfw: bool,
    pub auth: String,
}

impl fmt::Debug for CreatePost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatePost")
            .field("name", &self.name)
            .field("community_id", &self.community_id)
            .field("url", &self.url)
            .field("body", &self.body)
            .field("nsfw", &self.nsfw)
            .field("auth", &"<redacted>")
            .finish()
    }
}

/// The parts of the create-post response the importer reads.
#[derive(Deserialize, Debug, Clone)]
pub struct PostResponse {
    pub post_view: PostView,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PostView {
    pub post: Post,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Post {
    pub id: i64,
    /// Federated URL of the new post.
    #[serde(default)]
    pub ap_id: Option<String>,
}

/// The remote calls the importer makes.
#[async_trait]
pub trait LemmyApi: Send + Sync {
    async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, ApiError>;

    async fn create_post(&self, request: &CreatePost) -> Result<PostResponse, ApiError>;
}

/// `reqwest`-backed client bound to one Lemmy instance.
#[derive(Clone)]
pub struct LemmyClient {
    client: Client,
    base_url: Url,
}

impl LemmyClient {
    /// Build a client for the instance at `base_url`. No request is made.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(LemmyClient { client, base_url })
    }

    // Appends `api/v3/<path>` to the base path; query and fragment are dropped.
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        // `new` rejects URLs that cannot be a base, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v3"])
                .extend(path.split('/'));
        }
        url
    }

    fn auth_headers(token: &str) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}

#[async_trait]
impl LemmyApi for LemmyClient {
    async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint("user/login");
        tracing::debug!(%url, user = request.username_or_email, "sending login request");
        let res = self.client.post(url).json(request).send().await?;
        let res = Self::check(res).await?;
        res.json().await.map_err(ApiError::Malformed)
    }

    async fn create_post(&self, request: &CreatePost) -> Result<PostResponse, ApiError> {
        let url = self.endpoint("post");
        let res = self
            .client
            .post(url)
            .headers(Self::auth_headers(&request.auth)?)
            .json(request)
            .send()
            .await?;
        let res = Self::check(res).await?;
        res.json().await.map_err(ApiError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let with = LemmyClient::new(Url::parse("https://lemmy.example/").unwrap()).unwrap();
        let without = LemmyClient::new(Url::parse("https://lemmy.example").unwrap()).unwrap();
        assert_eq!(with.endpoint("post").as_str(), "https://lemmy.example/api/v3/post");
        assert_eq!(without.endpoint("post").as_str(), "https://lemmy.example/api/v3/post");
    }

    #[test]
    fn endpoint_keeps_path_prefix() {
        let client = LemmyClient::new(Url::parse("https://example.com/lemmy").unwrap()).unwrap();
        assert_eq!(
            client.endpoint("user/login").as_str(),
            "https://example.com/lemmy/api/v3/user/login"
        );
    }

    #[test]
    fn endpoint_drops_query_and_fragment() {
        let client = LemmyClient::new(Url::parse("https://lemmy.example/?x=1#top").unwrap()).unwrap();
        assert_eq!(
            client.endpoint("post").as_str(),
            "https://lemmy.example/api/v3/post"
        );
    }

    #[test]
    fn rejects_url_that_cannot_be_a_base() {
        let result = LemmyClient::new(Url::parse("mailto:admin@lemmy.example").unwrap());
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn create_post_debug_hides_token() {
        let request = CreatePost {
            name: "A".into(),
            community_id: CommunityId(3),
            url: None,
            body: "/p/1".into(),
            nsfw: false,
            auth: "secret-jwt".into(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("secret-jwt"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(matches!(
            LemmyClient::auth_headers("bad\ntoken"),
            Err(ApiError::InvalidToken)
        ));
    }
}
