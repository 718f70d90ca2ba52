use crate::error::CoreError;
use crate::filter::CategoryFilter;
use crate::flatten::Flattener;
use crate::source::RedditSource;
use crate::types::{Category, CommentFetchMode, FetchResult, ListingMode, Post, RawPost};
use tracing::{debug, info, warn};

/// Parameters for one fetch run, collected up front by the shell.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub subreddit: String,
    pub mode: ListingMode,
    pub limit: u32,
    pub comment_mode: CommentFetchMode,
    pub category: Option<Category>,
}

impl FetchRequest {
    /// Category label used in the output record and filename; "all" when
    /// no filter is active.
    pub fn category_label(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("all")
    }
}

/// Applies the category filter to each fetched post and attaches flattened
/// comment trees when requested. Pure over its inputs; the only I/O is the
/// comment fetch through the source capability.
pub struct PostProcessor {
    filter: Option<CategoryFilter>,
    comment_mode: CommentFetchMode,
    flattener: Flattener,
}

impl PostProcessor {
    pub fn new(category: Option<&Category>, comment_mode: CommentFetchMode) -> Self {
        let flattener = match comment_mode {
            CommentFetchMode::TopLevel => Flattener::with_max_depth(1),
            _ => Flattener::default(),
        };
        Self {
            filter: category.map(CategoryFilter::new),
            comment_mode,
            flattener,
        }
    }

    /// Returns `Ok(None)` when the active category matches neither title
    /// nor selftext. A transient comment-fetch failure keeps the post with
    /// an empty comment list; partial results are preferred over aborting.
    pub async fn process<S: RedditSource>(
        &self,
        source: &S,
        subreddit: &str,
        raw: &RawPost,
    ) -> Result<Option<Post>, CoreError> {
        if let Some(filter) = &self.filter {
            if !filter.matches(&raw.title) && !filter.matches(&raw.selftext) {
                debug!(post_id = %raw.id, "post matched no category keyword, dropped");
                return Ok(None);
            }
        }

        let comments = match self.comment_mode {
            CommentFetchMode::None => None,
            CommentFetchMode::TopLevel | CommentFetchMode::Full => {
                match source.comment_tree(subreddit, &raw.id).await {
                    Ok(nodes) => Some(self.flattener.flatten(&nodes)),
                    Err(e) if e.is_transient() => {
                        warn!(post_id = %raw.id, error = %e, "comment fetch failed, keeping post without comments");
                        Some(Vec::new())
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        Ok(Some(Post {
            id: raw.id.clone(),
            title: raw.title.clone(),
            author: raw.author.clone(),
            selftext: raw.selftext.clone(),
            score: raw.score,
            url: raw.url.clone(),
            created_utc: raw.created_utc,
            num_comments: raw.num_comments,
            comments,
        }))
    }
}

/// Runs one complete fetch: lists posts, skips stickied announcements,
/// filters and annotates the rest, and assembles the write-once result.
pub async fn run_fetch<S: RedditSource>(
    source: &S,
    request: &FetchRequest,
) -> Result<FetchResult, CoreError> {
    info!(
        subreddit = %request.subreddit,
        mode = request.mode.as_str(),
        limit = request.limit,
        category = request.category_label(),
        "starting fetch"
    );

    let raw_posts = source
        .list_posts(&request.subreddit, request.mode, request.limit)
        .await?;
    let fetched = raw_posts.len();

    let processor = PostProcessor::new(request.category.as_ref(), request.comment_mode);
    let mut posts = Vec::new();
    let mut skipped = 0usize;

    for raw in &raw_posts {
        if raw.stickied {
            debug!(post_id = %raw.id, "skipping stickied post");
            skipped += 1;
            continue;
        }
        match processor.process(source, &request.subreddit, raw).await? {
            Some(post) => posts.push(post),
            None => skipped += 1,
        }
    }

    info!(fetched, kept = posts.len(), skipped, "fetch complete");

    Ok(FetchResult {
        category: request.category_label().to_string(),
        posts,
    })
}
