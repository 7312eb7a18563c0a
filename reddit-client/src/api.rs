use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use subwatch_core::{Config, CoreError, PostSearch, RedditApiError, RedditPost, SearchRequest};
use tracing::{debug, error, info, warn};

const REDDIT_PUBLIC_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    /// Reddit occasionally returns `null` in place of a child; those are kept
    /// as `None` so callers can skip them.
    #[serde(default = "Vec::new")]
    pub children: Vec<Option<RedditListingChild<T>>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`.
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub created_utc: f64,
}

/// Unauthenticated client for Reddit's public JSON listings.
#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_http_client(http_client, config.user_agent.clone()))
    }

    pub fn with_http_client(http_client: Client, user_agent: String) -> Self {
        Self {
            http_client,
            base_url: REDDIT_PUBLIC_BASE.to_string(),
            user_agent,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn make_request(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let start_time = Instant::now();

        debug!("Making Reddit request: GET {}", endpoint);
        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        debug!(
            "Reddit responded {} for {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );

        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        Err(CoreError::RedditApi(status_to_error(
            status,
            endpoint,
            retry_after_seconds(&response),
        )))
    }

    /// Run a subreddit-restricted search and return the raw listing.
    pub async fn search_subreddit(
        &self,
        request: &SearchRequest,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/search.json", request.subreddit);
        let params = search_params(request);

        let response = self.make_request(&endpoint, &params).await?;
        let body = response.text().await?;

        let listing: RedditListing<RedditPostData> =
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse search results: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!(
                        "Failed to parse search results for '{}' in r/{}",
                        request.term, request.subreddit
                    ),
                })
            })?;

        info!(
            "Retrieved {} posts matching '{}' from r/{}",
            listing.data.children.len(),
            request.term,
            request.subreddit
        );
        Ok(listing)
    }
}

#[async_trait]
impl PostSearch for RedditApiClient {
    async fn search_posts(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Option<RedditPost>>, CoreError> {
        let listing = self.search_subreddit(request).await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.map(|c| RedditPost::from(c.data)))
            .collect())
    }
}

/// Query string for a search. The anchor goes out as `before`: in a
/// newest-first listing that is the parameter selecting items newer than
/// the given fullname.
fn search_params(request: &SearchRequest) -> Vec<(&str, &str)> {
    let mut params = vec![
        ("q", request.term.as_str()),
        ("restrict_sr", "true"),
        ("sort", request.sort.as_str()),
        ("t", request.time_window.as_str()),
        ("raw_json", "1"),
    ];
    if let Some(anchor) = request.after.as_deref() {
        params.push(("before", anchor));
    }
    params
}

fn retry_after_seconds(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .map(|secs| secs.ceil() as u64)
        .unwrap_or(60)
}

fn status_to_error(status: StatusCode, endpoint: &str, retry_after: u64) -> RedditApiError {
    match status.as_u16() {
        429 => {
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::SubredditNotFound {
            subreddit: subreddit_from_endpoint(endpoint),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}

fn subreddit_from_endpoint(endpoint: &str) -> String {
    endpoint
        .trim_start_matches("/r/")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        // Self posts and some crossposts carry no external link.
        let url = if post_data.url.is_empty() {
            format!("{}{}", REDDIT_PUBLIC_BASE, post_data.permalink)
        } else {
            post_data.url
        };

        Self {
            id: post_data.name,
            title: post_data.title,
            url,
            subreddit: post_data.subreddit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subwatch_core::{SearchSort, TimeWindow};

    fn post_data(name: &str, url: &str, permalink: &str) -> RedditPostData {
        RedditPostData {
            id: name.trim_start_matches("t3_").to_string(),
            name: name.to_string(),
            title: "RTX 4070 $499".to_string(),
            url: url.to_string(),
            permalink: permalink.to_string(),
            subreddit: "buildapcsales".to_string(),
            created_utc: 1_700_000_000.0,
        }
    }

    #[test]
    fn test_reddit_post_conversion_uses_fullname() {
        let reddit_post: RedditPost =
            post_data("t3_abc123", "https://shop.example/gpu", "/r/buildapcsales/comments/abc123")
                .into();
        assert_eq!(reddit_post.id, "t3_abc123");
        assert_eq!(reddit_post.title, "RTX 4070 $499");
        assert_eq!(reddit_post.url, "https://shop.example/gpu");
        assert_eq!(reddit_post.subreddit, "buildapcsales");
    }

    #[test]
    fn test_reddit_post_conversion_falls_back_to_permalink() {
        let reddit_post: RedditPost =
            post_data("t3_abc123", "", "/r/buildapcsales/comments/abc123/").into();
        assert_eq!(
            reddit_post.url,
            "https://www.reddit.com/r/buildapcsales/comments/abc123/"
        );
    }

    #[test]
    fn test_listing_without_children_decodes_empty() {
        let body = r#"{"kind": "Listing", "data": {"after": null, "before": null}}"#;
        let listing: RedditListing<RedditPostData> = serde_json::from_str(body).unwrap();
        assert!(listing.data.children.is_empty());
    }

    #[test]
    fn test_search_params_without_anchor() {
        let request = SearchRequest::newest_today("gpu", "buildapcsales");
        let params = search_params(&request);
        assert!(params.contains(&("q", "gpu")));
        assert!(params.contains(&("restrict_sr", "true")));
        assert!(params.contains(&("sort", "new")));
        assert!(params.contains(&("t", "day")));
        assert!(!params.iter().any(|(k, _)| *k == "before"));
    }

    #[test]
    fn test_search_params_with_anchor() {
        let request =
            SearchRequest::newest_today("gpu", "buildapcsales").with_after(Some("t3_zzz"));
        assert_eq!(request.sort, SearchSort::New);
        assert_eq!(request.time_window, TimeWindow::Day);
        let params = search_params(&request);
        assert!(params.contains(&("before", "t3_zzz")));
    }

    #[test]
    fn test_status_mapping() {
        let endpoint = "/r/buildapcsales/search.json";
        assert!(matches!(
            status_to_error(StatusCode::TOO_MANY_REQUESTS, endpoint, 12),
            RedditApiError::RateLimitExceeded { retry_after: 12 }
        ));
        assert!(matches!(
            status_to_error(StatusCode::FORBIDDEN, endpoint, 60),
            RedditApiError::Forbidden { .. }
        ));
        match status_to_error(StatusCode::NOT_FOUND, endpoint, 60) {
            RedditApiError::SubredditNotFound { subreddit } => {
                assert_eq!(subreddit, "buildapcsales")
            }
            other => panic!("Expected SubredditNotFound, got {:?}", other),
        }
        assert!(matches!(
            status_to_error(StatusCode::BAD_GATEWAY, endpoint, 60),
            RedditApiError::ServerError { status_code: 502 }
        ));
        assert!(matches!(
            status_to_error(StatusCode::IM_A_TEAPOT, endpoint, 60),
            RedditApiError::InvalidResponse { .. }
        ));
    }
}
