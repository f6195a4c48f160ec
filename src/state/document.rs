use crate::state::StatusKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata carried by a crawled page and every chunk derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Company the page belongs to; a filterable facet downstream
    pub company_name: String,

    /// Normalized URL the page was fetched from
    pub source_url: String,

    /// Host of the source URL
    pub domain: String,

    pub word_count: usize,

    /// When the page was fetched (serialized as ISO-8601)
    pub scraped_at: DateTime<Utc>,
}

/// Plain text of one successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// A page whose final attempt was not a success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub company_name: String,
    pub status: StatusKind,
    pub error_detail: String,
}
