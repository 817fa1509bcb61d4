//! HTTP-backed platform client.
//!
//! Speaks the v1.1 REST surface (`search/tweets`, `statuses/mentions_timeline`,
//! `statuses/update`). Requests are signed with OAuth 1.0a user-context
//! credentials; a plain bearer token is accepted for proxies that handle
//! signing themselves.

use crate::client::{
    Author, MentionsQuery, Platform, PlatformError, PlatformFuture, Post, PostedReply, Reply,
    SearchQuery,
};
use oauth1_request as oauth;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

// ── Wire types ──

#[derive(Deserialize)]
struct WireSearch {
    statuses: Vec<WirePost>,
}

#[derive(Deserialize)]
struct WirePost {
    id: u64,
    #[serde(default, alias = "full_text")]
    text: String,
    user: WireUser,
    #[serde(default)]
    possibly_sensitive: Option<bool>,
    #[serde(default)]
    retweeted_status: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct WireUser {
    screen_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct WireCreated {
    id: u64,
}

// Request parameters are both signed and sent as the query string.

#[derive(Serialize, oauth::Request)]
struct SearchParams<'a> {
    q: &'a str,
    lang: &'a str,
    count: u32,
}

#[derive(Serialize, oauth::Request)]
struct MentionsParams {
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    since_id: Option<u64>,
}

#[derive(Serialize, oauth::Request)]
struct UpdateParams<'a> {
    status: &'a str,
    in_reply_to_status_id: u64,
}

impl From<WirePost> for Post {
    fn from(w: WirePost) -> Self {
        Self {
            id: w.id,
            author: Author {
                handle: w.user.screen_name,
                name: w.user.name.unwrap_or_default(),
                bio: w.user.description.unwrap_or_default(),
            },
            text: w.text,
            sensitive: w.possibly_sensitive.unwrap_or(false),
            retweet: w.retweeted_status.is_some(),
        }
    }
}

// ── Auth ──

/// How requests are authorized.
pub enum Auth {
    /// OAuth 1.0a user context: consumer key/secret plus access token/secret.
    OAuth1(oauth::Token),
    /// Pre-issued bearer token, for a proxy base URL.
    Bearer(String),
}

impl Auth {
    pub fn oauth1(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_secret: impl Into<String>,
    ) -> Self {
        Self::OAuth1(oauth::Token::from_parts(
            consumer_key.into(),
            consumer_secret.into(),
            access_token.into(),
            access_secret.into(),
        ))
    }

    /// `Authorization` header value for one request. `url` carries no query;
    /// the parameters are signed separately.
    fn header<R>(&self, method: &reqwest::Method, url: &str, params: &R) -> String
    where
        R: oauth::Request,
    {
        match self {
            Self::OAuth1(token) if *method == reqwest::Method::POST => {
                oauth::post(url, params, token, oauth::HMAC_SHA1)
            }
            Self::OAuth1(token) => oauth::get(url, params, token, oauth::HMAC_SHA1),
            Self::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

// ── Client ──

/// reqwest-based platform client.
pub struct HttpPlatform {
    client: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl HttpPlatform {
    /// Build from credentials + optional base URL override.
    pub fn new(
        auth: Auth,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::RequestFailed(e.to_string()))?;
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Ok(Self {
            client,
            base_url: base.trim_end_matches('/').to_owned(),
            auth,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Sign and send one request; `params` go out as the query string.
    async fn call<P, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        params: &P,
    ) -> Result<T, PlatformError>
    where
        P: Serialize + oauth::Request,
        T: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint(path);
        let authorization = self.auth.header(&method, &url, params);
        let resp = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, authorization)
            .query(params)
            .send()
            .await
            .map_err(|e| PlatformError::RequestFailed(e.to_string()))?;
        decode(resp).await
    }

    async fn search_posts(&self, query: SearchQuery) -> Result<Vec<Post>, PlatformError> {
        let params = SearchParams {
            q: &query.query,
            lang: &query.lang,
            count: query.count,
        };
        let page: WireSearch = self
            .call(reqwest::Method::GET, "search/tweets.json", &params)
            .await?;
        tracing::debug!(count = page.statuses.len(), "search page fetched");
        Ok(page.statuses.into_iter().map(Post::from).collect())
    }

    async fn mention_posts(&self, query: MentionsQuery) -> Result<Vec<Post>, PlatformError> {
        let params = MentionsParams {
            count: query.count,
            since_id: query.since_id,
        };
        let page: Vec<WirePost> = self
            .call(reqwest::Method::GET, "statuses/mentions_timeline.json", &params)
            .await?;
        tracing::debug!(count = page.len(), since_id = ?query.since_id, "mentions page fetched");
        Ok(page.into_iter().map(Post::from).collect())
    }

    async fn post_reply(&self, reply: Reply) -> Result<PostedReply, PlatformError> {
        let params = UpdateParams {
            status: &reply.status,
            in_reply_to_status_id: reply.in_reply_to,
        };
        let created: WireCreated = self
            .call(reqwest::Method::POST, "statuses/update.json", &params)
            .await?;
        Ok(PostedReply { id: created.id })
    }
}

/// Map error statuses, then decode the JSON body.
async fn decode<T: for<'de> Deserialize<'de>>(
    resp: reqwest::Response,
) -> Result<T, PlatformError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(check_error(status, body));
    }
    resp.json()
        .await
        .map_err(|e| PlatformError::Decode(e.to_string()))
}

fn check_error(status: reqwest::StatusCode, body: String) -> PlatformError {
    match status.as_u16() {
        401 | 403 => PlatformError::Unauthorized(body),
        429 => PlatformError::RateLimited,
        _ => PlatformError::RequestFailed(format!("{status}: {body}")),
    }
}

impl Platform for HttpPlatform {
    fn name(&self) -> &str {
        "http"
    }

    fn search(&self, query: SearchQuery) -> PlatformFuture<'_, Vec<Post>> {
        Box::pin(self.search_posts(query))
    }

    fn mentions(&self, query: MentionsQuery) -> PlatformFuture<'_, Vec<Post>> {
        Box::pin(self.mention_posts(query))
    }

    fn reply(&self, reply: Reply) -> PlatformFuture<'_, PostedReply> {
        Box::pin(self.post_reply(reply))
    }
}

/// Build a platform client from environment variables.
///
/// OAuth 1.0a when `PEDANT_CONSUMER_KEY`, `PEDANT_CONSUMER_SECRET`,
/// `PEDANT_ACCESS_TOKEN` and `PEDANT_ACCESS_TOKEN_SECRET` are all set,
/// otherwise `PEDANT_API_TOKEN` as a bearer token. `PEDANT_API_BASE_URL`
/// optionally overrides the endpoint. Returns `None` without credentials.
pub fn from_env(timeout: Duration) -> Option<Result<HttpPlatform, PlatformError>> {
    let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    let auth = match (
        var("PEDANT_CONSUMER_KEY"),
        var("PEDANT_CONSUMER_SECRET"),
        var("PEDANT_ACCESS_TOKEN"),
        var("PEDANT_ACCESS_TOKEN_SECRET"),
    ) {
        (Some(ck), Some(cs), Some(at), Some(ats)) => Auth::oauth1(ck, cs, at, ats),
        _ => Auth::Bearer(var("PEDANT_API_TOKEN")?),
    };
    Some(HttpPlatform::new(auth, var("PEDANT_API_BASE_URL"), timeout))
}
