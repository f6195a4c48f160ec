/// Page fetch outcome definitions
///
/// Every attempt to load a page ends in exactly one `FetchOutcome`.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one page-load attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    // ===== Terminal States =====
    /// Page loaded and yielded enough readable text
    Success {
        /// Plain text extracted from the rendered page
        text: String,
        /// Fully rendered markup, used for link extraction
        raw_markup: String,
        word_count: usize,
    },

    /// Page text matched a known anti-bot or access-denied phrase
    Blocked { reason: String },

    // ===== Retryable States =====
    /// Navigation did not reach DOM-ready within the page timeout
    Timeout,

    /// Server answered with an HTTP status >= 400
    NetworkError { http_status: u16 },

    /// Page rendered, but with too few words to be useful
    ContentTooShort { word_count: usize },

    /// Any other failure while opening, loading, or reading the tab
    UnknownError { message: String },
}

impl FetchOutcome {
    /// Returns the status kind of this outcome
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Success { .. } => StatusKind::Success,
            Self::Blocked { .. } => StatusKind::Blocked,
            Self::Timeout => StatusKind::Timeout,
            Self::NetworkError { .. } => StatusKind::NetworkError,
            Self::ContentTooShort { .. } => StatusKind::ContentTooShort,
            Self::UnknownError { .. } => StatusKind::UnknownError,
        }
    }

    /// Returns true if no further attempt should be made
    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Rendered markup, present only for successful fetches
    pub fn raw_markup(&self) -> Option<&str> {
        match self {
            Self::Success { raw_markup, .. } => Some(raw_markup),
            _ => None,
        }
    }

    /// Human-readable cause, recorded in failure records
    pub fn detail(&self) -> String {
        match self {
            Self::Success { word_count, .. } => format!("{} words", word_count),
            Self::Blocked { reason } => format!("blocked: {}", reason),
            Self::Timeout => "navigation timed out".to_string(),
            Self::NetworkError { http_status } => format!("HTTP {}", http_status),
            Self::ContentTooShort { word_count } => {
                format!("only {} words of content", word_count)
            }
            Self::UnknownError { message } => message.clone(),
        }
    }
}

/// Payload-free classification of a fetch outcome, used as a counter key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Success,
    Timeout,
    NetworkError,
    ContentTooShort,
    Blocked,
    UnknownError,
}

impl StatusKind {
    /// All status kinds, in reporting order
    pub const ALL: [StatusKind; 6] = [
        Self::Success,
        Self::Timeout,
        Self::NetworkError,
        Self::ContentTooShort,
        Self::Blocked,
        Self::UnknownError,
    ];

    /// Returns true if this kind stops retrying
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Blocked)
    }

    /// Returns true if another attempt may change the result
    pub fn is_retryable(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::NetworkError => "network_error",
            Self::ContentTooShort => "content_too_short",
            Self::Blocked => "blocked",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
