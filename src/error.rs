/// Error types for Only One Tab
use thiserror::Error;

/// A URL that cannot be classified; such URLs are never tracked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("empty URL")]
    Empty,
    #[error("malformed URL `{url}`: {source}")]
    Malformed {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure reported by the browser for a tab, window, badge or storage call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    /// The tab id is no longer known to the browser.
    #[error("tab {tab_id} no longer exists")]
    TabNotFound { tab_id: i32 },
    #[error("browser rejected `{command}`: {message}")]
    Command { command: String, message: String },
    /// The browser returned a value that does not have the expected shape.
    #[error("unexpected value from the browser, {message}")]
    Malformed { message: String },
}

/// A pattern rule rejected before it reaches the stored list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("pattern is empty")]
    Empty,
    #[error("wildcard pattern `{pattern}` must look like *.example.com")]
    InvalidWildcard { pattern: String },
    #[error("`{pattern}` is not a valid domain")]
    InvalidDomain { pattern: String },
    #[error("`{pattern}` is not a valid regular expression: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("this pattern already exists")]
    Duplicate,
}

/// Failure of a settings mutation, the stored settings are left unchanged.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("invalid settings file: {message}")]
    Import { message: String },
}

impl From<serde_json::Error> for SettingsError {
    fn from(error: serde_json::Error) -> Self {
        SettingsError::Import {
            message: error.to_string(),
        }
    }
}
