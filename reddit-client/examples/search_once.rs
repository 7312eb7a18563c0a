use reddit_client::RedditApiClient;
use subwatch_core::{Config, PostSearch, SearchRequest};

/// Runs a single search using the same environment the service reads and
/// prints what a poll cycle would notify about.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let client = RedditApiClient::new(&config)?;

    for term in &config.search_terms {
        let request = SearchRequest::newest_today(term, &config.search_subreddit);
        let posts = client.search_posts(&request).await?;

        println!("'{}' in r/{}: {} result(s)", term, config.search_subreddit, posts.len());
        for post in posts.into_iter().flatten() {
            println!("  {}  {}\n      {}", post.id, post.title, post.url);
        }
    }

    Ok(())
}
