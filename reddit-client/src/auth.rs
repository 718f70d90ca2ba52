use crate::RedditClientConfig;
use rfetcher_core::{CoreError, RedditApiError};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{error, info};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Refresh this long before the advertised expiry to avoid racing it.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl RedditToken {
    pub fn new(access_token: String, expires_in_secs: u64) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in_secs),
        }
    }

    pub fn needs_refresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    // Reddit reports grant failures as a field in a 200 response.
    error: Option<serde_json::Value>,
}

/// Requests an access token with the password grant for script apps.
pub(crate) async fn fetch_token(
    http_client: &reqwest::Client,
    config: &RedditClientConfig,
) -> Result<RedditToken, CoreError> {
    info!(username = %config.username, "requesting Reddit OAuth token (password grant)");

    let response = match http_client
        .post(TOKEN_URL)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[
            ("grant_type", "password"),
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
        ])
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return Err(RedditApiError::RequestTimeout.into()),
        Err(e) => return Err(CoreError::Network(e)),
    };

    let status = response.status();
    if status.as_u16() == 401 {
        return Err(RedditApiError::AuthenticationFailed {
            reason: "client id/secret rejected".to_string(),
        }
        .into());
    }
    if !status.is_success() {
        return Err(RedditApiError::AuthenticationFailed {
            reason: format!("token endpoint returned {status}"),
        }
        .into());
    }

    let body: TokenResponse = response.json().await.map_err(|e| {
        error!("failed to parse token response: {}", e);
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: "malformed token response".to_string(),
        })
    })?;

    if let Some(grant_error) = body.error {
        return Err(RedditApiError::AuthenticationFailed {
            reason: format!("grant rejected: {grant_error}"),
        }
        .into());
    }

    let access_token = body.access_token.ok_or_else(|| {
        CoreError::RedditApi(RedditApiError::AuthenticationFailed {
            reason: "token response carried no access token".to_string(),
        })
    })?;

    info!("Reddit OAuth token acquired");
    Ok(RedditToken::new(access_token, body.expires_in.unwrap_or(3600)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_does_not_need_refresh() {
        let token = RedditToken::new("abc".to_string(), 3600);
        assert!(!token.needs_refresh());
    }

    #[test]
    fn test_token_within_margin_needs_refresh() {
        let token = RedditToken::new("abc".to_string(), 30);
        assert!(token.needs_refresh());
    }

    #[test]
    fn test_expired_token_needs_refresh() {
        let token = RedditToken {
            access_token: "abc".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(token.needs_refresh());
    }

    #[test]
    fn test_token_response_with_grant_error() {
        let body: TokenResponse =
            serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(body.access_token.is_none());
        assert_eq!(body.error.unwrap(), serde_json::json!("invalid_grant"));
    }

    #[test]
    fn test_token_response_success_shape() {
        let body: TokenResponse = serde_json::from_str(
            r#"{"access_token": "tok123", "token_type": "bearer", "expires_in": 86400, "scope": "*"}"#,
        )
        .unwrap();
        assert_eq!(body.access_token.as_deref(), Some("tok123"));
        assert_eq!(body.expires_in, Some(86400));
        assert!(body.error.is_none());
    }
}
