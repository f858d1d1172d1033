use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("could not interact with {target}: {reason}")]
    Interaction { target: String, reason: String },

    #[error("field {field} not found on page")]
    MissingField { field: String },

    #[error("record for {professor} failed validation: {}", violations.join("; "))]
    Validation {
        professor: String,
        violations: Vec<String>,
    },

    #[error("webdriver session error: {0}")]
    Session(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ScraperError {
    /// Returns `true` if the error represents a transient condition worth
    /// another attempt after a backoff delay.
    ///
    /// Retriable: navigation and interaction failures, and transport-level
    /// HTTP failures (timeouts, refused connections). Everything else is a
    /// data or configuration problem that a retry would not fix.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ScraperError::Navigation { .. } | ScraperError::Interaction { .. } => true,
            ScraperError::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
