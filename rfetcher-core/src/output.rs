use crate::error::CoreError;
use crate::types::FetchResult;
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reduces a subreddit or category name to a filesystem-safe token:
/// lowercase, with every non-alphanumeric character mapped to `_`.
pub fn sanitize_token(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Derives the output filename for one run:
/// `{subreddit}_{category}_{YYYYMMDD_HHMMSS}.json`.
pub fn output_filename(subreddit: &str, category: &str, when: NaiveDateTime) -> String {
    format!(
        "{}_{}_{}.json",
        sanitize_token(subreddit),
        sanitize_token(category),
        when.format("%Y%m%d_%H%M%S")
    )
}

/// Writes one `FetchResult` as pretty-printed UTF-8 JSON under the data
/// directory, creating it if absent. Write failures abort the run; there
/// is no retry.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    base_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, result: &FetchResult, subreddit: &str) -> Result<PathBuf, CoreError> {
        self.write_at(result, subreddit, Local::now().naive_local())
    }

    fn write_at(
        &self,
        result: &FetchResult,
        subreddit: &str,
        when: NaiveDateTime,
    ) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self
            .base_dir
            .join(output_filename(subreddit, &result.category, when));

        let json = serde_json::to_string_pretty(result)?;
        fs::write(&path, json)?;

        info!(path = %path.display(), posts = result.posts.len(), "wrote fetch result");
        Ok(path)
    }
}
