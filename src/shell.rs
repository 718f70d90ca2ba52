use rfetcher_core::{
    run_fetch, Category, CategoryStore, CommentFetchMode, CoreError, FetchRequest, ListingMode,
    OutputWriter, RedditApiError, RedditSource,
};
use std::io::{BufRead, Write};
use url::Url;

const DEFAULT_POST_COUNT: u32 = 50;

/// Interactive menu loop over generic reader/writer so tests can script it.
/// Invalid input at any prompt re-prompts; end of input exits cleanly.
pub struct Shell<'a, R, W> {
    input: R,
    output: W,
    store: &'a mut CategoryStore,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(input: R, output: W, store: &'a mut CategoryStore) -> Self {
        Self {
            input,
            output,
            store,
        }
    }

    pub async fn run<S: RedditSource>(
        &mut self,
        source: &S,
        writer: &OutputWriter,
    ) -> Result<(), CoreError> {
        loop {
            writeln!(self.output, "\n{}", "=".repeat(50))?;
            writeln!(self.output, "RFetcher - Main Menu")?;
            writeln!(self.output, "{}", "=".repeat(50))?;
            writeln!(self.output, "1. Manage categories")?;
            writeln!(self.output, "2. Run fetcher")?;
            writeln!(self.output, "3. Exit")?;

            let Some(choice) = self.prompt("\nEnter choice: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => {
                    if self.manage_categories()?.is_none() {
                        return Ok(());
                    }
                }
                "2" => {
                    if self.fetch_flow(source, writer).await?.is_none() {
                        return Ok(());
                    }
                }
                "3" => {
                    writeln!(self.output, "Exiting...")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    /// Reads one trimmed line; `None` means end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>, CoreError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn manage_categories(&mut self) -> Result<Option<()>, CoreError> {
        loop {
            writeln!(self.output, "\n{}", "=".repeat(50))?;
            writeln!(self.output, "Category Management")?;
            writeln!(self.output, "{}", "=".repeat(50))?;

            let listing = self.category_listing();
            if listing.is_empty() {
                writeln!(self.output, "No categories defined yet")?;
            } else {
                writeln!(self.output, "Current categories:")?;
                for (index, (name, keywords)) in listing.iter().enumerate() {
                    writeln!(self.output, "{}. {}: {}", index + 1, name, keywords)?;
                }
            }

            writeln!(self.output, "\n1. Add category")?;
            writeln!(self.output, "2. Edit category")?;
            writeln!(self.output, "3. Delete category")?;
            writeln!(self.output, "4. Back to main menu")?;

            let Some(choice) = self.prompt("\nEnter choice: ")? else {
                return Ok(None);
            };
            match choice.as_str() {
                "1" => {
                    let Some(name) = self.prompt("New category name: ")? else {
                        return Ok(None);
                    };
                    if name.is_empty() {
                        writeln!(self.output, "Category name cannot be empty")?;
                        continue;
                    }
                    let Some(keywords) = self.prompt("Keywords (comma separated): ")? else {
                        return Ok(None);
                    };
                    self.store.set(&name, &keywords);
                    self.store.save()?;
                    writeln!(self.output, "Added '{name}'")?;
                }
                "2" => {
                    let Some(name) = self.pick_category_name(&listing)? else {
                        return Ok(None);
                    };
                    let Some(name) = name else { continue };
                    let Some(keywords) = self.prompt("New keywords (comma separated): ")? else {
                        return Ok(None);
                    };
                    self.store.set(&name, &keywords);
                    self.store.save()?;
                    writeln!(self.output, "Updated '{name}'")?;
                }
                "3" => {
                    let Some(name) = self.pick_category_name(&listing)? else {
                        return Ok(None);
                    };
                    let Some(name) = name else { continue };
                    self.store.remove(&name);
                    self.store.save()?;
                    writeln!(self.output, "Deleted '{name}'")?;
                }
                "4" => return Ok(Some(())),
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    /// Owned snapshot of the store: (name, joined keywords), listing order.
    fn category_listing(&self) -> Vec<(String, String)> {
        self.store
            .names()
            .into_iter()
            .map(|name| {
                let keywords = self
                    .store
                    .keywords(name)
                    .map(|k| k.join(", "))
                    .unwrap_or_default();
                (name.to_string(), keywords)
            })
            .collect()
    }

    /// Prompts for a 1-based category number; inner `None` means the
    /// selection was invalid and the caller should re-show the menu.
    fn pick_category_name(
        &mut self,
        listing: &[(String, String)],
    ) -> Result<Option<Option<String>>, CoreError> {
        if listing.is_empty() {
            writeln!(self.output, "No categories defined yet")?;
            return Ok(Some(None));
        }
        let Some(input) = self.prompt("Category number: ")? else {
            return Ok(None);
        };
        let selected = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| listing.get(i))
            .map(|(name, _)| name.clone());
        if selected.is_none() {
            writeln!(self.output, "Invalid category number")?;
        }
        Ok(Some(selected))
    }

    async fn fetch_flow<S: RedditSource>(
        &mut self,
        source: &S,
        writer: &OutputWriter,
    ) -> Result<Option<()>, CoreError> {
        let Some(request) = self.collect_request()? else {
            return Ok(None);
        };

        writeln!(
            self.output,
            "\nFetching r/{} ({} posts, {} listing)...",
            request.subreddit,
            request.limit,
            request.mode.as_str()
        )?;

        match run_fetch(source, &request).await {
            Ok(result) => {
                let path = writer.write(&result, &request.subreddit)?;
                writeln!(
                    self.output,
                    "Collected {} posts. Saved to {}",
                    result.posts.len(),
                    path.display()
                )?;
            }
            Err(
                e @ CoreError::RedditApi(
                    RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken,
                ),
            ) => return Err(e),
            Err(e) => writeln!(self.output, "Fetch failed: {e}")?,
        }
        Ok(Some(()))
    }

    fn collect_request(&mut self) -> Result<Option<FetchRequest>, CoreError> {
        let Some(subreddit) = self.prompt_subreddit()? else {
            return Ok(None);
        };
        let Some(mode) = self.prompt_listing_mode()? else {
            return Ok(None);
        };
        let Some(limit) = self.prompt_count()? else {
            return Ok(None);
        };
        let Some(comment_mode) = self.prompt_comment_mode()? else {
            return Ok(None);
        };
        let Some(category) = self.prompt_category()? else {
            return Ok(None);
        };

        Ok(Some(FetchRequest {
            subreddit,
            mode,
            limit,
            comment_mode,
            category,
        }))
    }

    fn prompt_subreddit(&mut self) -> Result<Option<String>, CoreError> {
        loop {
            let Some(input) = self.prompt("\nSubreddit URL or name (e.g. 'rust'): ")? else {
                return Ok(None);
            };
            let name = extract_subreddit_name(&input);
            if name.is_empty() {
                writeln!(self.output, "Subreddit cannot be empty")?;
                continue;
            }
            return Ok(Some(name));
        }
    }

    fn prompt_listing_mode(&mut self) -> Result<Option<ListingMode>, CoreError> {
        loop {
            writeln!(self.output, "\nSelect post listing:")?;
            for (index, mode) in ListingMode::ALL.iter().enumerate() {
                writeln!(self.output, "{}. {}", index + 1, mode.as_str())?;
            }
            let Some(input) = self.prompt("Enter choice (1-4, default=1): ")? else {
                return Ok(None);
            };
            match parse_listing_mode(&input) {
                Some(mode) => return Ok(Some(mode)),
                None => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    fn prompt_count(&mut self) -> Result<Option<u32>, CoreError> {
        loop {
            let Some(input) = self.prompt(&format!(
                "Number of posts to fetch (default={DEFAULT_POST_COUNT}): "
            ))?
            else {
                return Ok(None);
            };
            match parse_count(&input) {
                Some(count) => return Ok(Some(count)),
                None => writeln!(self.output, "Enter a positive number")?,
            }
        }
    }

    fn prompt_comment_mode(&mut self) -> Result<Option<CommentFetchMode>, CoreError> {
        loop {
            writeln!(self.output, "\nComment fetching:")?;
            writeln!(self.output, "1. No comments")?;
            writeln!(self.output, "2. Top-level comments only")?;
            writeln!(self.output, "3. Full comment trees")?;
            let Some(input) = self.prompt("Enter choice (1-3, default=1): ")? else {
                return Ok(None);
            };
            match parse_comment_mode(&input) {
                Some(mode) => return Ok(Some(mode)),
                None => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    fn prompt_category(&mut self) -> Result<Option<Option<Category>>, CoreError> {
        if self.store.is_empty() {
            writeln!(
                self.output,
                "\nNo categories defined; fetching without keyword filtering"
            )?;
            return Ok(Some(None));
        }

        let listing = self.category_listing();
        loop {
            writeln!(self.output, "\nAvailable categories:")?;
            writeln!(self.output, "0. none (no keyword filtering)")?;
            for (index, (name, keywords)) in listing.iter().enumerate() {
                writeln!(self.output, "{}. {}: {}", index + 1, name, keywords)?;
            }
            let Some(input) = self.prompt("Select category (default=0): ")? else {
                return Ok(None);
            };
            if input.is_empty() || input == "0" {
                return Ok(Some(None));
            }
            let picked = input
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| listing.get(i))
                .and_then(|(name, _)| self.store.get(name));
            match picked {
                Some(category) => return Ok(Some(Some(category))),
                None => writeln!(self.output, "Invalid category number")?,
            }
        }
    }
}

/// Accepts a bare name, an `r/name` prefix, or a full reddit.com URL.
pub fn extract_subreddit_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.contains("reddit.com") {
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        if let Ok(url) = Url::parse(&with_scheme) {
            if let Some(mut segments) = url.path_segments() {
                while let Some(segment) = segments.next() {
                    if segment == "r" {
                        if let Some(name) = segments.next() {
                            return name.to_string();
                        }
                    }
                }
            }
        }
    }
    trimmed.trim_start_matches("r/").trim_matches('/').to_string()
}

fn parse_listing_mode(input: &str) -> Option<ListingMode> {
    match input {
        "" | "1" => Some(ListingMode::Hot),
        "2" => Some(ListingMode::New),
        "3" => Some(ListingMode::Top),
        "4" => Some(ListingMode::Rising),
        _ => None,
    }
}

fn parse_comment_mode(input: &str) -> Option<CommentFetchMode> {
    match input {
        "" | "1" => Some(CommentFetchMode::None),
        "2" => Some(CommentFetchMode::TopLevel),
        "3" => Some(CommentFetchMode::Full),
        _ => None,
    }
}

fn parse_count(input: &str) -> Option<u32> {
    if input.is_empty() {
        return Some(DEFAULT_POST_COUNT);
    }
    input.parse::<u32>().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfetcher_core::RawPost;
    use std::io::Cursor;

    #[test]
    fn test_extract_subreddit_name() {
        assert_eq!(extract_subreddit_name("rust"), "rust");
        assert_eq!(extract_subreddit_name("  rust  "), "rust");
        assert_eq!(extract_subreddit_name("r/rust"), "rust");
        assert_eq!(
            extract_subreddit_name("https://www.reddit.com/r/rust/"),
            "rust"
        );
        assert_eq!(extract_subreddit_name("reddit.com/r/programming"), "programming");
        assert_eq!(
            extract_subreddit_name("https://reddit.com/r/rust/comments/abc"),
            "rust"
        );
        assert_eq!(extract_subreddit_name(""), "");
    }

    #[test]
    fn test_parse_listing_mode() {
        assert_eq!(parse_listing_mode(""), Some(ListingMode::Hot));
        assert_eq!(parse_listing_mode("1"), Some(ListingMode::Hot));
        assert_eq!(parse_listing_mode("2"), Some(ListingMode::New));
        assert_eq!(parse_listing_mode("3"), Some(ListingMode::Top));
        assert_eq!(parse_listing_mode("4"), Some(ListingMode::Rising));
        assert_eq!(parse_listing_mode("5"), None);
        assert_eq!(parse_listing_mode("hot"), None);
    }

    #[test]
    fn test_parse_comment_mode() {
        assert_eq!(parse_comment_mode(""), Some(CommentFetchMode::None));
        assert_eq!(parse_comment_mode("2"), Some(CommentFetchMode::TopLevel));
        assert_eq!(parse_comment_mode("3"), Some(CommentFetchMode::Full));
        assert_eq!(parse_comment_mode("x"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(""), Some(DEFAULT_POST_COUNT));
        assert_eq!(parse_count("25"), Some(25));
        assert_eq!(parse_count("0"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("abc"), None);
    }

    struct EmptySource;

    impl RedditSource for EmptySource {
        async fn list_posts(
            &self,
            _subreddit: &str,
            _mode: ListingMode,
            _limit: u32,
        ) -> Result<Vec<RawPost>, CoreError> {
            Ok(vec![RawPost {
                id: "p1".to_string(),
                title: "a rust post".to_string(),
                author: "someone".to_string(),
                selftext: String::new(),
                score: 1,
                url: "https://example.com".to_string(),
                created_utc: 1692110000,
                num_comments: 0,
                stickied: false,
            }])
        }

        async fn comment_tree(
            &self,
            _subreddit: &str,
            _post_id: &str,
        ) -> Result<Vec<rfetcher_core::CommentNode>, CoreError> {
            Ok(vec![])
        }
    }

    fn store_at(dir: &tempfile::TempDir) -> CategoryStore {
        CategoryStore::load(dir.path().join("categories.toml")).unwrap()
    }

    #[test]
    fn test_manage_categories_add_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);

        let input = Cursor::new("1\nGaming\nSteam, console ,steam\n4\n");
        let mut output = Vec::new();
        let mut shell = Shell::new(input, &mut output, &mut store);
        shell.manage_categories().unwrap();

        let reloaded = store_at(&dir);
        let category = reloaded.get("Gaming").unwrap();
        assert_eq!(category.keywords, vec!["steam", "console"]);
    }

    #[test]
    fn test_invalid_menu_choice_reprompts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);

        let input = Cursor::new("9\n4\n");
        let mut output = Vec::new();
        let mut shell = Shell::new(input, &mut output, &mut store);
        shell.manage_categories().unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Invalid choice"));
    }

    #[tokio::test]
    async fn test_full_session_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);
        let writer = OutputWriter::new(dir.path().join("data"));

        // Run fetcher: r/rust, hot, 5 posts, no comments, then exit.
        let input = Cursor::new("2\nrust\n1\n5\n1\n3\n");
        let mut output = Vec::new();
        let mut shell = Shell::new(input, &mut output, &mut store);
        shell.run(&EmptySource, &writer).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("data"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("rust_all_"));

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Collected 1 posts"));
    }

    #[tokio::test]
    async fn test_end_of_input_exits_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);
        let writer = OutputWriter::new(dir.path().join("data"));

        let input = Cursor::new("");
        let mut output = Vec::new();
        let mut shell = Shell::new(input, &mut output, &mut store);
        assert!(shell.run(&EmptySource, &writer).await.is_ok());
    }
}
