use serde::{Deserialize, Serialize};

/// Sort order for a subreddit's post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Hot,
    New,
    Top,
    Rising,
}

impl ListingMode {
    pub const ALL: [ListingMode; 4] = [
        ListingMode::Hot,
        ListingMode::New,
        ListingMode::Top,
        ListingMode::Rising,
    ];

    /// Path segment used by the Reddit listing endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingMode::Hot => "hot",
            ListingMode::New => "new",
            ListingMode::Top => "top",
            ListingMode::Rising => "rising",
        }
    }
}

/// How much of each post's comment tree is fetched and attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentFetchMode {
    /// No comment fetching; the `comments` field is omitted from output.
    None,
    /// Only top-level comments, with empty reply lists.
    TopLevel,
    /// The full tree, bounded by the flattener's depth and node caps.
    Full,
}

/// A named keyword set used to include posts by substring match.
/// Defined once per run from the category store; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Lowercase, trimmed, deduplicated.
    pub keywords: Vec<String>,
}

/// Post data as materialized at the client boundary. Fields are read-only
/// inputs to the pipeline; the output shape is [`Post`].
#[derive(Debug, Clone)]
pub struct RawPost {
    pub id: String,
    pub title: String,
    pub author: String,
    pub selftext: String,
    pub score: i64,
    pub url: String,
    pub created_utc: i64,
    pub num_comments: u32,
    pub stickied: bool,
}

/// A fully materialized comment tree node. `More` marks Reddit's truncated
/// reply placeholder; it is never dereferenced, only skipped downstream.
#[derive(Debug, Clone)]
pub enum CommentNode {
    Comment {
        id: String,
        author: String,
        body: String,
        score: i64,
        created_utc: i64,
        children: Vec<CommentNode>,
    },
    More,
}

/// Serialized comment shape. Field order matches the documented file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: i64,
    pub replies: Vec<Comment>,
}

/// Serialized post shape. `comments` is `None` when comment fetching was
/// not requested for the run and the field is omitted from the JSON;
/// otherwise it is always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    pub selftext: String,
    pub score: i64,
    pub url: String,
    pub created_utc: i64,
    pub num_comments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

/// Root object written to disk, one per run, write-once. Every post in
/// `posts` matched the active category filter (or no filter was active).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub category: String,
    pub posts: Vec<Post>,
}
