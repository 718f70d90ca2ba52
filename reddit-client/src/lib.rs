mod api;
mod auth;
mod rate_limiter;
#[cfg(test)]
mod tests;

pub use api::{
    RedditListing, RedditListingChild, RedditListingData, RedditPostData, RedditUserData,
};
pub use auth::RedditToken;
pub use rate_limiter::{RateLimitConfig, RateLimiter};

use rfetcher_core::{CoreError, Credentials};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Everything needed to authenticate a script-type Reddit application
/// with the password grant.
#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditClientConfig {
    pub fn new(
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        user_agent: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            username,
            password,
            user_agent,
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        let user_agent = credentials.user_agent();
        Self::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            credentials.username.clone(),
            credentials.password.clone(),
            user_agent,
        )
    }
}

/// Authenticated Reddit API client. Owns the OAuth token lifecycle and a
/// token-bucket rate limiter; every request waits on both before hitting
/// the network.
#[derive(Debug)]
pub struct RedditClient {
    http_client: reqwest::Client,
    config: RedditClientConfig,
    rate_limiter: RateLimiter,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig) -> Result<Self, CoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            config,
            rate_limiter: RateLimiter::new(&RateLimitConfig::reddit_oauth()),
            token: Mutex::new(None),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.needs_refresh())
    }

    /// Returns a valid access token, fetching or refreshing as needed.
    pub(crate) async fn ensure_token(&self) -> Result<String, CoreError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.access_token.clone());
            }
            debug!("access token near expiry, refreshing");
        }

        let token = auth::fetch_token(&self.http_client, &self.config).await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }
}
