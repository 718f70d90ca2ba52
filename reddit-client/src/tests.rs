use crate::{RedditClient, RedditClientConfig};
use rfetcher_core::Credentials;

fn create_test_config() -> RedditClientConfig {
    RedditClientConfig::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        "test_user".to_string(),
        "test_password".to_string(),
        "rfetcher/0.1 by test_user".to_string(),
    )
}

#[test]
fn test_config_creation() {
    let config = create_test_config();
    assert_eq!(config.client_id, "test_client_id");
    assert_eq!(config.client_secret, "test_client_secret");
    assert_eq!(config.username, "test_user");
    assert_eq!(config.user_agent, "rfetcher/0.1 by test_user");
}

#[test]
fn test_config_from_credentials() {
    let credentials = Credentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        username: "someone".to_string(),
        password: "pw".to_string(),
    };
    let config = RedditClientConfig::from_credentials(&credentials);
    assert_eq!(config.client_id, "id");
    assert_eq!(config.user_agent, "rfetcher/0.1 by someone");
}

#[tokio::test]
async fn test_client_creation() {
    let client = RedditClient::new(create_test_config());
    assert!(client.is_ok());

    let client = client.unwrap();
    assert_eq!(client.user_agent(), "rfetcher/0.1 by test_user");
    assert!(!client.is_authenticated().await);
}
