use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum NotificationError {
    #[error("Message delivery failed with status {status_code}")]
    DeliveryFailed { status_code: u16 },

    #[error("Could not build request for {endpoint}")]
    InvalidRequest { endpoint: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}
