use crate::types::Category;
use regex::RegexSet;

/// Normalizes a comma-separated keyword string into a lowercase, trimmed,
/// deduplicated list, preserving first-seen order.
pub fn parse_keywords(input: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    for part in input.split(',') {
        let keyword = part.trim().to_lowercase();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords
}

/// Substring keyword matcher over one category's keyword set.
///
/// Matching is substring-based, so short keywords (e.g. "ai") can
/// over-match. An empty keyword set matches nothing.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    keywords: Vec<String>,
}

impl CategoryFilter {
    pub fn new(category: &Category) -> Self {
        Self {
            keywords: category
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        self.keywords.iter().any(|keyword| text.contains(keyword))
    }
}

const REDDIT_REFERENCE_PATTERNS: &[&str] = &[
    r"reddit\.com/r/",
    r"reddit\.com/user/",
    r"reddit\.com/u/",
    r"\br/\w+",
    r"\bu/\w+",
    r"\bsubreddit\b",
    r"\bredditors?\b",
    r"join (our|this) sub",
    r"crosspost",
    r"x-post",
    r"check out (r/|u/)",
];

/// Drops comments whose body references Reddit itself (subreddit plugs,
/// crossposts, user mentions). A matching comment is dropped together
/// with its subtree.
#[derive(Debug, Clone)]
pub struct CommentFilter {
    patterns: RegexSet,
}

impl Default for CommentFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentFilter {
    pub fn new() -> Self {
        Self {
            // Patterns are static and known-valid.
            patterns: RegexSet::new(REDDIT_REFERENCE_PATTERNS)
                .expect("invalid Reddit reference pattern"),
        }
    }

    pub fn is_reddit_related(&self, text: &str) -> bool {
        self.patterns.is_match(&text.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(keywords: &[&str]) -> Category {
        Category {
            name: "test".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn test_matches_any_keyword_substring() {
        let filter = CategoryFilter::new(&category(&["python", "java", "rust"]));
        assert!(filter.matches("Learning Rust basics"));
        assert!(filter.matches("Java vs Kotlin"));
        assert!(!filter.matches("Best pizza recipes"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let filter = CategoryFilter::new(&category(&["RuSt"]));
        assert!(filter.matches("learning rust"));
        assert!(filter.matches("LEARNING RUST"));
    }

    #[test]
    fn test_short_keywords_over_match_by_design() {
        let filter = CategoryFilter::new(&category(&["ai"]));
        assert!(filter.matches("maintenance work"));
    }

    #[test]
    fn test_empty_keyword_set_matches_nothing() {
        let filter = CategoryFilter::new(&category(&[]));
        assert!(!filter.matches("anything at all"));
        assert!(!filter.matches(""));
    }

    #[test]
    fn test_parse_keywords_trims_lowercases_dedupes() {
        let keywords = parse_keywords("  Python, java ,RUST,, python ");
        assert_eq!(keywords, vec!["python", "java", "rust"]);
    }

    #[test]
    fn test_parse_keywords_empty_input() {
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" , , ").is_empty());
    }

    #[test]
    fn test_comment_filter_detects_reddit_references() {
        let filter = CommentFilter::new();
        assert!(filter.is_reddit_related("check r/rust for more"));
        assert!(filter.is_reddit_related("see https://reddit.com/r/programming"));
        assert!(filter.is_reddit_related("this is a crosspost from elsewhere"));
        assert!(filter.is_reddit_related("Join our sub!"));
        assert!(filter.is_reddit_related("fellow Redditors will know"));
        assert!(!filter.is_reddit_related("I like writing parsers in Rust"));
    }
}
