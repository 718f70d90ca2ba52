use crate::error::{ConfigError, CoreError};
use crate::filter::parse_keywords;
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reddit API credentials, read from the process environment before any
/// network call. Missing any variable is a fatal startup error.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

pub const REQUIRED_ENV_VARS: [&str; 4] = [
    "REDDIT_CLIENT_ID",
    "REDDIT_CLIENT_SECRET",
    "REDDIT_USERNAME",
    "REDDIT_PASSWORD",
];

impl Credentials {
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            client_id: require_env("REDDIT_CLIENT_ID")?,
            client_secret: require_env("REDDIT_CLIENT_SECRET")?,
            username: require_env("REDDIT_USERNAME")?,
            password: require_env("REDDIT_PASSWORD")?,
        })
    }

    /// Reddit asks API clients to identify themselves with a descriptive
    /// User-Agent including the username.
    pub fn user_agent(&self) -> String {
        format!("rfetcher/0.1 by {}", self.username)
    }
}

fn require_env(var_name: &str) -> Result<String, CoreError> {
    match std::env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        }
        .into()),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CategoryFile {
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
}

/// Durable named keyword sets, loaded at startup and persisted on every
/// change. Keys are sorted for stable listing order across runs.
#[derive(Debug)]
pub struct CategoryStore {
    path: PathBuf,
    categories: BTreeMap<String, Vec<String>>,
}

impl CategoryStore {
    /// Loads the store from a TOML file. A missing file is an empty store;
    /// a malformed file is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let categories = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let file: CategoryFile = toml::from_str(&raw).map_err(ConfigError::Parse)?;
            info!(path = %path.display(), count = file.categories.len(), "loaded category store");
            file.categories
        } else {
            debug!(path = %path.display(), "no category store file, starting empty");
            BTreeMap::new()
        };
        Ok(Self { path, categories })
    }

    pub fn save(&self) -> Result<(), CoreError> {
        let file = CategoryFile {
            categories: self.categories.clone(),
        };
        let raw = toml::to_string_pretty(&file).map_err(ConfigError::Serialize)?;
        fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), "saved category store");
        Ok(())
    }

    /// Adds or replaces a category. Keywords are normalized through
    /// [`parse_keywords`].
    pub fn set(&mut self, name: &str, keywords_input: &str) {
        self.categories
            .insert(name.to_string(), parse_keywords(keywords_input));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.categories.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Category> {
        self.categories.get(name).map(|keywords| Category {
            name: name.to_string(),
            keywords: keywords.clone(),
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn keywords(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.toml");

        let mut store = CategoryStore::load(&path).unwrap();
        assert!(store.is_empty());

        store.set("Programming", "Python, java ,RUST");
        store.set("Web Development", "html, css");
        store.save().unwrap();

        let reloaded = CategoryStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        let category = reloaded.get("Programming").unwrap();
        assert_eq!(category.keywords, vec!["python", "java", "rust"]);
        // BTreeMap keeps listing order stable.
        assert_eq!(reloaded.names(), vec!["Programming", "Web Development"]);
    }

    #[test]
    fn test_store_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.toml");
        let mut store = CategoryStore::load(&path).unwrap();

        store.set("Gaming", "steam, console");
        assert!(store.remove("Gaming"));
        assert!(!store.remove("Gaming"));
        assert!(store.get("Gaming").is_none());
    }

    #[test]
    fn test_malformed_store_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.toml");
        fs::write(&path, "categories = \"not a table\"").unwrap();

        assert!(matches!(
            CategoryStore::load(&path),
            Err(CoreError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_missing_env_var_is_fatal() {
        // Variable name chosen to never exist in the test environment.
        let err = require_env("RFETCHER_TEST_DOES_NOT_EXIST").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::MissingEnvironmentVariable { .. })
        ));
    }

    #[test]
    fn test_user_agent_includes_username() {
        let creds = Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "someone".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(creds.user_agent(), "rfetcher/0.1 by someone");
    }
}
