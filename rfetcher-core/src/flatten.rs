use crate::filter::CommentFilter;
use crate::types::{Comment, CommentNode};
use tracing::debug;

/// Depth past which reply chains are truncated. Depth 1 is the top level.
pub const DEFAULT_MAX_DEPTH: usize = 10;
/// Cap on total emitted comments per post, bounding memory and file size.
pub const DEFAULT_MAX_NODES: usize = 2000;

/// Converts a materialized comment forest into the serializable tree shape.
///
/// `More` placeholders are skipped, never dereferenced. Recursion stops at
/// `max_depth` and output stops growing at `max_nodes`; neither condition
/// is an error. Comments that reference Reddit itself are dropped together
/// with their replies.
#[derive(Debug, Clone)]
pub struct Flattener {
    pub max_depth: usize,
    pub max_nodes: usize,
    comment_filter: CommentFilter,
}

impl Default for Flattener {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            comment_filter: CommentFilter::new(),
        }
    }
}

impl Flattener {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn flatten(&self, nodes: &[CommentNode]) -> Vec<Comment> {
        let mut budget = self.max_nodes;
        let comments = self.convert_level(nodes, 1, &mut budget);
        if budget == 0 {
            debug!(max_nodes = self.max_nodes, "comment node cap reached");
        }
        comments
    }

    fn convert_level(
        &self,
        nodes: &[CommentNode],
        depth: usize,
        budget: &mut usize,
    ) -> Vec<Comment> {
        if depth > self.max_depth {
            return Vec::new();
        }

        let mut out = Vec::new();
        for node in nodes {
            if *budget == 0 {
                break;
            }
            let (id, author, body, score, created_utc, children) = match node {
                CommentNode::More => continue,
                CommentNode::Comment {
                    id,
                    author,
                    body,
                    score,
                    created_utc,
                    children,
                } => (id, author, body, *score, *created_utc, children),
            };

            if self.comment_filter.is_reddit_related(body) {
                debug!(comment_id = %id, "skipping Reddit self-referential comment");
                continue;
            }

            *budget -= 1;
            let replies = self.convert_level(children, depth + 1, budget);
            out.push(Comment {
                id: id.clone(),
                author: author.clone(),
                body: body.clone(),
                score,
                created_utc,
                replies,
            });
        }
        out
    }
}
