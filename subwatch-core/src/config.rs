use crate::ConfigError;
use std::fmt;
use std::time::Duration;

pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const REDDIT_SEARCH_SUBREDDIT: &str = "REDDIT_SEARCH_SUBREDDIT";
pub const REDDIT_SEARCH_TERMS: &str = "REDDIT_SEARCH_TERMS";
pub const POLL_INTERVAL_MINUTES: &str = "POLL_INTERVAL_MINUTES";
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";

const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Process-wide settings, loaded once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub telegram_chat_id: String,
    pub telegram_token: String,
    pub search_subreddit: String,
    pub search_terms: Vec<String>,
    pub polling_interval: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables, reading a `.env`
    /// file first when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key).ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: key.to_string(),
            })
        };

        let telegram_chat_id = required(TELEGRAM_CHAT_ID)?;
        let telegram_token = required(TELEGRAM_TOKEN)?;
        let search_subreddit = required(REDDIT_SEARCH_SUBREDDIT)?;
        let search_terms = parse_terms(&required(REDDIT_SEARCH_TERMS)?);

        let search_subreddit = search_subreddit.trim().to_string();
        if search_subreddit.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: format!("{} must not be empty", REDDIT_SEARCH_SUBREDDIT),
            });
        }
        // Used verbatim as a URL path segment; `+` joins several subreddits.
        if !search_subreddit
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
        {
            return Err(ConfigError::InvalidValue {
                field: REDDIT_SEARCH_SUBREDDIT.to_string(),
                value: search_subreddit,
            });
        }
        if search_terms.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: format!("{} must list at least one term", REDDIT_SEARCH_TERMS),
            });
        }

        let polling_minutes =
            parse_positive(POLL_INTERVAL_MINUTES, lookup(POLL_INTERVAL_MINUTES))?
                .unwrap_or(DEFAULT_POLL_INTERVAL_MINUTES);
        let polling_secs = polling_minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: POLL_INTERVAL_MINUTES.to_string(),
                value: polling_minutes.to_string(),
            })?;
        let timeout_secs = parse_positive(REQUEST_TIMEOUT_SECS, lookup(REQUEST_TIMEOUT_SECS))?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let user_agent = lookup(REDDIT_USER_AGENT)
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(default_user_agent);

        Ok(Self {
            telegram_chat_id,
            telegram_token,
            search_subreddit,
            search_terms,
            polling_interval: Duration::from_secs(polling_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            user_agent,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_token", &"<redacted>")
            .field("search_subreddit", &self.search_subreddit)
            .field("search_terms", &self.search_terms)
            .field("polling_interval", &self.polling_interval)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_user_agent() -> String {
    format!("subwatch/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_positive(field: &str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw,
        }),
    }
}
