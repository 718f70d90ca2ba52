mod shell;

use anyhow::Context;
use reddit_client::{RedditClient, RedditClientConfig};
use rfetcher_core::{CategoryStore, Credentials, OutputWriter};
use shell::Shell;
use std::io;
use tracing_subscriber::EnvFilter;

const CATEGORY_STORE_FILE: &str = "categories.toml";
const DATA_DIR: &str = "data";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env file.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("rfetcher=info,rfetcher_core=info,reddit_client=info")
        }))
        .init();
    tracing::debug!("starting rfetcher session");

    println!("RFetcher - Reddit Data Fetcher");
    println!("{}", "=".repeat(50));

    let credentials = Credentials::from_env().context(
        "missing Reddit credentials; set REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET, \
         REDDIT_USERNAME and REDDIT_PASSWORD",
    )?;

    let client = RedditClient::new(RedditClientConfig::from_credentials(&credentials))
        .context("failed to build Reddit client")?;

    let me = client
        .get_user_info()
        .await
        .context("Reddit authentication failed; verify credentials")?;
    println!("Authenticated as: {}", me.name);

    let mut store = CategoryStore::load(CATEGORY_STORE_FILE)
        .with_context(|| format!("failed to load {CATEGORY_STORE_FILE}"))?;
    let writer = OutputWriter::new(DATA_DIR);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(stdin.lock(), stdout.lock(), &mut store);
    shell.run(&client, &writer).await?;

    Ok(())
}
