use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Notification(e) => {
                error!("Notification error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    /// Whether the next poll cycle may succeed where this one failed.
    /// Only configuration problems are permanent.
    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(_) => true,
            CoreError::Notification(_) => true,
            CoreError::Network(_) => true,
            CoreError::Config(_) => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Notification(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Notification(_) => "NOTIFICATION".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            RedditApiError::RateLimitExceeded { .. } => true,
            RedditApiError::RequestTimeout => true,
            RedditApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Reddit asked to wait {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. The subreddit may be private or quarantined.",
                resource
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. It will be retried next cycle.".to_string()
            }
            _ => "Reddit API error occurred. It will be retried next cycle.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for NotificationError {
    fn log_error(&self) -> &Self {
        error!("NotificationError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("NotificationError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            NotificationError::DeliveryFailed { status_code } => {
                *status_code >= 500 || *status_code == 429
            }
            NotificationError::InvalidRequest { .. } => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            NotificationError::DeliveryFailed { status_code } => format!(
                "Telegram rejected the message (HTTP {}). Check the bot token and chat id.",
                status_code
            ),
            NotificationError::InvalidRequest { .. } => {
                "Could not build the Telegram request. Check the bot token.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            NotificationError::DeliveryFailed { .. } => "NOTIFY_DELIVERY_FAILED".to_string(),
            NotificationError::InvalidRequest { .. } => "NOTIFY_INVALID_REQUEST".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::MissingEnvironmentVariable { var_name } => {
                format!("Please set the {} environment variable.", var_name)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("'{}' is not a valid value for {}.", value, field)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is invalid: {}", reason)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
        }
    }
}
