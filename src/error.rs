//! Error types returned by the Fragment client.

use crate::fragment::models::Gift;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, FragmentError>;

/// Everything that can go wrong while listing or inspecting gifts.
#[derive(Debug, Error)]
pub enum FragmentError {
    /// A filter or sort value outside the allowed set. Raised before any request.
    #[error("invalid {field} '{value}': expected one of {}", allowed.join(", "))]
    InvalidParameter { field: &'static str, value: String, allowed: &'static [&'static str] },

    /// Connection failure or timeout while talking to the site.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Request rejected with a 4xx/5xx status, or one that could not be sent at all.
    #[error(
        "request to {url} failed{}: {message}",
        status.map(|s| format!(" with status {s}")).unwrap_or_default()
    )]
    Fetch { url: String, status: Option<u16>, message: String },

    /// The site answered 404 (unknown collection or gift id).
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The page was fetched but its essential structure is missing.
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    /// The client was used outside its open scope.
    #[error("session is closed; open the client before use")]
    SessionClosed,

    /// Pagination stopped on a failing page; the gifts gathered so far are kept.
    #[error("pagination stopped at page {page} after {} gifts: {source}", partial.len())]
    Partial { page: u32, partial: Vec<Gift>, source: Box<FragmentError> },

    /// The HTTP client could not be constructed (bad proxy URL and similar).
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FragmentError {
    pub(crate) fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse { context: context.into(), message: message.into() }
    }

    /// Gifts collected before a pagination failure, if any.
    pub fn partial_gifts(&self) -> Option<&[Gift]> {
        match self {
            Self::Partial { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Returns the innermost error, looking through `Partial`.
    pub fn root(&self) -> &FragmentError {
        match self {
            Self::Partial { source, .. } => source.root(),
            other => other,
        }
    }

    /// True if a retry might succeed: connection errors, timeouts, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Fetch { status: Some(s), .. } => *s >= 500 || *s == 429,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }
}
