use crate::error::CoreError;
use crate::types::{CommentNode, ListingMode, RawPost};

/// Capability to list posts and expand comment trees for a subreddit.
///
/// Implementors are responsible for:
/// - Authenticating with the Reddit API
/// - Pagination and rate limiting
/// - Returning fully materialized data, so that downstream tree walks
///   never trigger hidden network I/O
///
/// The concrete Reddit client implements this trait; tests substitute a
/// scripted double.
pub trait RedditSource: Send + Sync {
    /// Lists up to `limit` posts from a subreddit in the given sort order.
    fn list_posts(
        &self,
        subreddit: &str,
        mode: ListingMode,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<RawPost>, CoreError>> + Send;

    /// Fetches and materializes the comment tree for one post. `More`
    /// placeholders are preserved as markers, never dereferenced.
    fn comment_tree(
        &self,
        subreddit: &str,
        post_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CommentNode>, CoreError>> + Send;
}
