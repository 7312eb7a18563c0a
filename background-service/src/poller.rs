use crate::anchor::AnchorTracker;
use subwatch_core::{Config, CoreError, Notifier, PostSearch, SearchRequest};
use tracing::{debug, info};

/// Counts gathered over one pass over all search terms.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub terms_searched: usize,
    pub posts_found: usize,
    pub notifications_sent: usize,
}

/// Searches every configured term once and forwards new posts.
pub struct PollCycle<S, N> {
    searcher: S,
    notifier: N,
    subreddit: String,
    terms: Vec<String>,
    anchors: AnchorTracker,
}

impl<S: PostSearch, N: Notifier> PollCycle<S, N> {
    pub fn new(searcher: S, notifier: N, subreddit: String, terms: Vec<String>) -> Self {
        Self {
            searcher,
            notifier,
            subreddit,
            terms,
            anchors: AnchorTracker::new(),
        }
    }

    pub fn from_config(searcher: S, notifier: N, config: &Config) -> Self {
        Self::new(
            searcher,
            notifier,
            config.search_subreddit.clone(),
            config.search_terms.clone(),
        )
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn anchors(&self) -> &AnchorTracker {
        &self.anchors
    }

    /// One pass over all terms, in configuration order.
    ///
    /// The first search or delivery failure aborts the pass; terms after it
    /// are picked up again on the next cycle. A term's anchor is advanced as
    /// soon as its search returns, before any notification goes out, so posts
    /// left unsent by an abort are not searched for again.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CoreError> {
        let mut report = CycleReport::default();

        for term in &self.terms {
            let request = SearchRequest::newest_today(term, &self.subreddit)
                .with_after(self.anchors.get(term));

            let posts = self.searcher.search_posts(&request).await?;
            report.terms_searched += 1;
            let found = posts.iter().flatten().count();
            info!("found {} posts matching `{}`!", found, term);

            let Some(newest) = posts.iter().flatten().next() else {
                continue;
            };
            debug!("Advancing anchor for `{}` to {}", term, newest.id);
            self.anchors.set(term, &newest.id);
            report.posts_found += found;

            for post in posts.iter().flatten() {
                self.notifier.send(&post.title, &post.url).await?;
                report.notifications_sent += 1;
                debug!("Notified {} for `{}`", post.id, term);
            }
        }

        Ok(report)
    }
}
