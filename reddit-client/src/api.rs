use crate::RedditClient;
use rfetcher_core::{CommentNode, CoreError, ListingMode, RawPost, RedditApiError, RedditSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Listings are served in pages of at most 100 items.
const MAX_PAGE_SIZE: u32 = 100;

/// How many top-level comments to request per post.
const COMMENT_LIMIT: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: Option<String>,
    pub url: String,
    pub created_utc: f64,
    pub score: i64,
    pub num_comments: u32,
    #[serde(default)]
    pub stickied: bool,
}

impl From<RedditPostData> for RawPost {
    fn from(data: RedditPostData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            author: data.author.unwrap_or_else(|| "[deleted]".to_string()),
            selftext: data.selftext,
            score: data.score,
            url: data.url,
            created_utc: data.created_utc as i64,
            num_comments: data.num_comments,
            stickied: data.stickied,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditUserData {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RedditCommentData {
    id: String,
    author: Option<String>,
    body: String,
    score: i64,
    created_utc: f64,
    /// Either a nested listing object or the empty string.
    #[serde(default)]
    replies: Value,
}

impl RedditClient {
    /// Issues a GET against the OAuth API, waiting on the rate limiter and
    /// a valid token first. A single 429 is absorbed internally by honoring
    /// `retry-after`; other error statuses map onto the API error taxonomy.
    /// 404 is left to the caller, which knows what resource was missing.
    pub(crate) async fn make_request(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<reqwest::Response, CoreError> {
        let url = format!("{REDDIT_API_BASE}{endpoint}");
        let mut retried = false;

        loop {
            self.rate_limiter.acquire().await;
            let access_token = self.ensure_token().await?;

            debug!(%endpoint, "making Reddit API request");
            let response = match self
                .http_client
                .get(&url)
                .bearer_auth(&access_token)
                .query(query)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    error!(%endpoint, "request timed out");
                    return Err(RedditApiError::RequestTimeout.into());
                }
                Err(e) => {
                    error!(%endpoint, "network error: {}", e);
                    return Err(CoreError::Network(e));
                }
            };

            let status = response.status();
            if status.is_success() || status.as_u16() == 404 {
                return Ok(response);
            }

            match status.as_u16() {
                401 => return Err(RedditApiError::InvalidToken.into()),
                403 => {
                    return Err(RedditApiError::Forbidden {
                        resource: endpoint.to_string(),
                    }
                    .into())
                }
                429 => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    if !retried {
                        warn!(retry_after, %endpoint, "rate limited, backing off once");
                        tokio::time::sleep(Duration::from_secs(retry_after.min(60))).await;
                        retried = true;
                        continue;
                    }
                    return Err(RedditApiError::RateLimitExceeded { retry_after }.into());
                }
                code if status.is_server_error() => {
                    return Err(RedditApiError::ServerError { status_code: code }.into())
                }
                _ => {
                    return Err(RedditApiError::InvalidResponse {
                        details: format!("unexpected status {status} for {endpoint}"),
                    }
                    .into())
                }
            }
        }
    }

    /// Identity of the authenticated user, used as a login check at startup.
    pub async fn get_user_info(&self) -> Result<RedditUserData, CoreError> {
        let response = self.make_request("/api/v1/me", &[]).await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.ok();

        let user_data = parse_user_info(status, body)?;
        debug!(username = %user_data.name, "retrieved authenticated user info");
        Ok(user_data)
    }
}

/// Maps the identity endpoint response. `make_request` passes 404 through
/// for callers that know what resource was missing; here it means the token
/// does not resolve to a user, which is an authentication problem.
pub(crate) fn parse_user_info(
    status: u16,
    body: Option<Value>,
) -> Result<RedditUserData, CoreError> {
    if status == 404 {
        return Err(RedditApiError::AuthenticationFailed {
            reason: "identity endpoint returned 404".to_string(),
        }
        .into());
    }

    let data = body.ok_or_else(|| {
        error!("identity endpoint returned an unreadable body");
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "failed to parse user data".to_string(),
        })
    })?;
    serde_json::from_value(data).map_err(|e| {
        error!("failed to parse user data: {}", e);
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "failed to parse user data".to_string(),
        })
    })
}

impl RedditSource for RedditClient {
    /// Pages through the listing with `after` markers until `limit` posts
    /// are collected or the subreddit runs out.
    async fn list_posts(
        &self,
        subreddit: &str,
        mode: ListingMode,
        limit: u32,
    ) -> Result<Vec<RawPost>, CoreError> {
        let endpoint = format!("/r/{}/{}", subreddit, mode.as_str());
        let mut posts: Vec<RawPost> = Vec::new();
        let mut after: Option<String> = None;

        while (posts.len() as u32) < limit {
            let batch = (limit - posts.len() as u32).min(MAX_PAGE_SIZE);
            let mut params = vec![("limit".to_string(), batch.to_string())];
            if let Some(marker) = &after {
                params.push(("after".to_string(), marker.clone()));
            }

            let response = self.make_request(&endpoint, &params).await?;
            if response.status().as_u16() == 404 {
                return Err(RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                }
                .into());
            }

            let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
                error!("failed to parse subreddit posts: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("failed to parse posts for r/{subreddit}"),
                })
            })?;

            if listing.data.children.is_empty() {
                debug!(subreddit, "listing exhausted before requested limit");
                break;
            }

            after = listing.data.after.clone();
            posts.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .map(|child| RawPost::from(child.data)),
            );
            debug!(collected = posts.len(), limit, "collected listing page");

            if after.is_none() {
                break;
            }
        }

        info!("retrieved {} posts from r/{}", posts.len(), subreddit);
        Ok(posts)
    }

    async fn comment_tree(
        &self,
        subreddit: &str,
        post_id: &str,
    ) -> Result<Vec<CommentNode>, CoreError> {
        let endpoint = format!("/r/{subreddit}/comments/{post_id}");
        let params = vec![("limit".to_string(), COMMENT_LIMIT.to_string())];

        let response = self.make_request(&endpoint, &params).await?;
        if response.status().as_u16() == 404 {
            return Err(RedditApiError::PostNotFound {
                post_id: post_id.to_string(),
            }
            .into());
        }

        // The comments endpoint answers with a two-element array:
        // the post listing, then the comment listing.
        let body: Vec<Value> = response.json().await.map_err(|e| {
            error!("failed to parse comment response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("failed to parse comments for post {post_id}"),
            })
        })?;

        let children = body
            .get(1)
            .and_then(|listing| listing.get("data"))
            .and_then(|data| data.get("children"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("comment response for post {post_id} missing listing"),
                })
            })?;

        let nodes = materialize_forest(children);
        debug!(
            post_id,
            subtrees = nodes.len(),
            "materialized comment forest"
        );
        Ok(nodes)
    }
}

/// Converts raw listing children into materialized nodes. Each subtree is
/// converted independently so one malformed branch is dropped with a
/// warning while its siblings survive.
pub(crate) fn materialize_forest(children: &[Value]) -> Vec<CommentNode> {
    children.iter().filter_map(materialize_node).collect()
}

fn materialize_node(value: &Value) -> Option<CommentNode> {
    match value.get("kind").and_then(Value::as_str)? {
        "more" => Some(CommentNode::More),
        "t1" => {
            let data = value.get("data")?;
            let comment: RedditCommentData = match serde_json::from_value(data.clone()) {
                Ok(comment) => comment,
                Err(e) => {
                    warn!("skipping malformed comment subtree: {}", e);
                    return None;
                }
            };

            let children = comment
                .replies
                .get("data")
                .and_then(|data| data.get("children"))
                .and_then(Value::as_array)
                .map(|replies| materialize_forest(replies))
                .unwrap_or_default();

            Some(CommentNode::Comment {
                id: comment.id,
                author: comment.author.unwrap_or_else(|| "[deleted]".to_string()),
                body: comment.body,
                score: comment.score,
                created_utc: comment.created_utc as i64,
                children,
            })
        }
        kind => {
            debug!(kind, "ignoring unknown comment node kind");
            None
        }
    }
}
