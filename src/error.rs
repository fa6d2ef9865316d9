use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("transient Slack API error: {0}")]
    SlackTransient(String),

    #[error("Slack rate limit error: retry after {retry_after_secs}s")]
    SlackRateLimit { retry_after_secs: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl AppError {
    /// Whether a bounded retry of the whole operation may succeed.
    ///
    /// Rate limits, server-side API hiccups and truncated reads are worth
    /// another attempt; everything else (bad token, unknown channel, parse
    /// failures) fails the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::SlackTransient(_)
                | AppError::SlackRateLimit { .. }
                | AppError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
