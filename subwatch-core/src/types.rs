use crate::CoreError;
use async_trait::async_trait;

/// A single search hit. `id` is the Reddit fullname (`t3_...`), which is
/// what listing anchors are expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub url: String,
    pub subreddit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSort {
    New,
}

impl SearchSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSort::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub subreddit: String,
    pub sort: SearchSort,
    pub time_window: TimeWindow,
    /// When set, only results strictly newer than this fullname are returned.
    pub after: Option<String>,
}

impl SearchRequest {
    /// Newest-first search over the last day, the shape every poll uses.
    pub fn newest_today(term: &str, subreddit: &str) -> Self {
        Self {
            term: term.to_string(),
            subreddit: subreddit.to_string(),
            sort: SearchSort::New,
            time_window: TimeWindow::Day,
            after: None,
        }
    }

    pub fn with_after(mut self, after: Option<&str>) -> Self {
        self.after = after.map(str::to_string);
        self
    }
}

/// Search provider seam. Results come back newest first; entries the
/// provider could not materialize are `None`.
#[async_trait]
pub trait PostSearch: Send + Sync {
    async fn search_posts(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Option<RedditPost>>, CoreError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, link: &str) -> Result<(), CoreError>;
}
