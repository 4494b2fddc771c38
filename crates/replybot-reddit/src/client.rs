//! Blocking Reddit API client.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use replybot_core::{BotError, ContentSource, SourceError, SourceResult};
use replybot_models::{CommentNode, HistoryEntry, Item, Post};

use crate::credentials::RedditCredentials;
use crate::listing;

/// Maximum number of history items fetched per listing.
///
/// Reddit never pages past 1000 items, so this is also the platform cap.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

const DEFAULT_API_BASE: &str = "https://oauth.reddit.com/";
const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Largest page the listing endpoints accept.
const PAGE_SIZE: usize = 100;

/// Refresh the token this long before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URLs of the OAuth API and the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditEndpoints {
    /// Base for authenticated API calls; must end with `/`.
    pub api_base: Url,
    /// Password-grant token endpoint.
    pub token_url: Url,
}

impl RedditEndpoints {
    /// Parses both URLs, appending a trailing slash to the API base if missing.
    pub fn new(api_base: &str, token_url: &str) -> Result<Self, BotError> {
        let api_base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{}/", api_base)
        };
        let api_base = Url::parse(&api_base)
            .map_err(|e| BotError::Config(format!("invalid API base URL {}: {}", api_base, e)))?;
        let token_url = Url::parse(token_url)
            .map_err(|e| BotError::Config(format!("invalid token URL {}: {}", token_url, e)))?;
        Ok(Self {
            api_base,
            token_url,
        })
    }

    /// The public Reddit endpoints.
    pub fn reddit() -> Result<Self, BotError> {
        Self::new(DEFAULT_API_BASE, DEFAULT_TOKEN_URL)
    }

    /// Resolves an API path with `raw_json=1` and the given query pairs.
    pub fn api(&self, path: &str, query: &[(&str, &str)]) -> SourceResult<Url> {
        let mut url = self
            .api_base
            .join(path.trim_start_matches('/'))
            .map_err(|e| SourceError::Parse(format!("invalid API path {}: {}", path, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("raw_json", "1");
        }
        Ok(url)
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_token(body: Value, now: Instant) -> SourceResult<AccessToken> {
    let response: TokenResponse = serde_json::from_value(body)
        .map_err(|e| SourceError::Parse(format!("token response: {}", e)))?;
    if let Some(error) = response.error {
        return Err(SourceError::Authentication(error));
    }
    let value = response
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SourceError::Authentication("no access token in response".to_string()))?;
    let lifetime = Duration::from_secs(response.expires_in.unwrap_or(3600));
    Ok(AccessToken {
        value,
        expires_at: now + lifetime,
    })
}

fn http_error(e: reqwest::Error) -> SourceError {
    SourceError::Http(e.to_string())
}

/// Authenticated Reddit client.
///
/// Not `Sync`: the cached token lives in a `RefCell`, matching the bot's
/// single-threaded loop.
pub struct RedditClient {
    http: Client,
    credentials: RedditCredentials,
    endpoints: RedditEndpoints,
    username: String,
    history_limit: usize,
    token: RefCell<Option<AccessToken>>,
}

impl RedditClient {
    /// Authenticates against the public Reddit endpoints.
    pub fn connect(credentials: RedditCredentials) -> Result<Self, BotError> {
        Self::connect_with(credentials, RedditEndpoints::reddit()?)
    }

    /// Authenticates against custom endpoints and resolves the account name.
    pub fn connect_with(
        credentials: RedditCredentials,
        endpoints: RedditEndpoints,
    ) -> Result<Self, BotError> {
        let http = Client::builder()
            .user_agent(credentials.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BotError::Startup(format!("failed to build HTTP client: {}", e)))?;

        let mut client = Self {
            http,
            username: credentials.username.clone(),
            credentials,
            endpoints,
            history_limit: DEFAULT_HISTORY_LIMIT,
            token: RefCell::new(None),
        };

        let me = client
            .endpoints
            .api("api/v1/me", &[])
            .and_then(|url| client.get(url))
            .and_then(listing::parse_me)
            .map_err(|e| BotError::Startup(format!("Reddit authentication failed: {}", e)))?;
        client.username = me;

        info!(username = %client.username, "Reddit authenticated");
        Ok(client)
    }

    /// Caps how many items are read from each history listing.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Returns the authenticated account name.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn fetch_token(&self) -> SourceResult<AccessToken> {
        debug!(url = %self.endpoints.token_url, "requesting access token");
        let response = self
            .http
            .post(self.endpoints.token_url.clone())
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Authentication(
                "client id or secret rejected".to_string(),
            ));
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| SourceError::Parse(format!("token response: {}", e)))?;
        parse_token(body, Instant::now())
    }

    fn bearer(&self) -> SourceResult<String> {
        if let Some(token) = self.token.borrow().as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }
        let token = self.fetch_token()?;
        let value = token.value.clone();
        *self.token.borrow_mut() = Some(token);
        Ok(value)
    }

    /// Sends an authenticated request, re-authenticating once on 401.
    fn send<F>(&self, build: F) -> SourceResult<Value>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let mut retried = false;
        loop {
            let token = self.bearer()?;
            let response = build(&token).send().map_err(http_error)?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried {
                warn!("access token rejected, re-authenticating");
                self.token.borrow_mut().take();
                retried = true;
                continue;
            }
            if !status.is_success() {
                let message = response.text().unwrap_or_default();
                return Err(SourceError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return response
                .json()
                .map_err(|e| SourceError::Parse(e.to_string()));
        }
    }

    fn get(&self, url: Url) -> SourceResult<Value> {
        debug!(%url, "GET");
        self.send(|token| self.http.get(url.clone()).bearer_auth(token))
    }

    fn post_form(&self, url: Url, form: &[(&str, &str)]) -> SourceResult<Value> {
        debug!(%url, "POST");
        self.send(|token| self.http.post(url.clone()).bearer_auth(token).form(form))
    }

    fn history_listing(&self, kind: &str) -> SourceResult<Vec<HistoryEntry>> {
        let path = format!("user/{}/{}", self.username, kind);
        let page_size = PAGE_SIZE.to_string();
        let mut entries = Vec::new();
        let mut after: Option<String> = None;

        while entries.len() < self.history_limit {
            let mut query = vec![("limit", page_size.as_str())];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }
            let url = self.endpoints.api(&path, &query)?;
            let (page, next) = listing::parse_history_page(self.get(url)?)?;
            let empty = page.is_empty();
            entries.extend(page);

            match next {
                Some(cursor) if !empty => after = Some(cursor),
                _ => break,
            }
        }

        entries.truncate(self.history_limit);
        debug!(kind, count = entries.len(), "fetched history listing");
        Ok(entries)
    }
}

impl ContentSource for RedditClient {
    fn new_posts(&self, collection: &str, limit: usize) -> SourceResult<Vec<Post>> {
        let limit = limit.clamp(1, PAGE_SIZE).to_string();
        let url = self
            .endpoints
            .api(&format!("r/{}/new", collection), &[("limit", limit.as_str())])?;
        let (posts, _) = listing::parse_post_listing(self.get(url)?)?;
        Ok(posts)
    }

    fn comments(&self, post: &Post) -> SourceResult<Vec<CommentNode>> {
        let url = self
            .endpoints
            .api(&format!("comments/{}", post.id), &[])?;
        listing::parse_comment_tree(self.get(url)?)
    }

    fn submit_reply(&self, item: &Item, text: &str) -> SourceResult<()> {
        let url = self.endpoints.api("api/comment", &[])?;
        let thing_id = item.fullname();
        let response = self.post_form(
            url,
            &[
                ("thing_id", thing_id.as_str()),
                ("text", text),
                ("api_type", "json"),
            ],
        )?;
        listing::check_reply_response(response)?;
        info!(thing_id = %thing_id, "reply submitted");
        Ok(())
    }

    fn own_history(&self) -> SourceResult<Vec<HistoryEntry>> {
        let mut entries = self.history_listing("comments")?;
        entries.extend(self.history_listing("submitted")?);
        Ok(entries)
    }
}
