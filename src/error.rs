use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Navigation failed for {url}: {reason}")]
    NavigationTimeout { url: String, reason: String },

    #[error("Failed to extract product info from {url}: {reason}")]
    ExtractionFailed { url: String, reason: String },

    #[error("Browser launch error: {0}")]
    Launch(String),

    #[error("Scrape task error: {0}")]
    Task(String),
}

impl ScrapeError {
    pub fn navigation(url: &str, reason: impl std::fmt::Display) -> Self {
        ScrapeError::NavigationTimeout {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(url: &str, reason: impl std::fmt::Display) -> Self {
        ScrapeError::ExtractionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ScrapeError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScrapeError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
