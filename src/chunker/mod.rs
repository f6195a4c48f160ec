//! Text chunking for indexing
//!
//! Splits each crawled document into overlapping windows of bounded size.
//! Breaks are taken at paragraph, then line, then sentence, then word
//! boundaries before falling back to a hard character cut. Every chunk
//! carries its source document's metadata unchanged.

mod splitter;

use crate::config::ChunkerSettings;
use crate::state::{CrawledDocument, DocumentMetadata};
use serde::{Deserialize, Serialize};
use splitter::TextSplitter;

/// A bounded window of document text, the unit handed to indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Splits documents into [`TextChunk`]s
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    splitter: TextSplitter,
}

impl Chunker {
    pub fn new(settings: ChunkerSettings) -> Self {
        Self {
            splitter: TextSplitter::new(settings.chunk_size, settings.chunk_overlap),
        }
    }

    /// Chunks every document, keeping document order and chunk order
    pub fn chunk(&self, documents: &[CrawledDocument]) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = documents
            .iter()
            .flat_map(|document| self.chunk_document(document))
            .collect();

        tracing::debug!(
            "Split {} document(s) into {} chunk(s)",
            documents.len(),
            chunks.len()
        );
        chunks
    }

    pub fn chunk_document(&self, document: &CrawledDocument) -> Vec<TextChunk> {
        self.split_text(&document.text)
            .into_iter()
            .map(|text| TextChunk {
                text,
                metadata: document.metadata.clone(),
            })
            .collect()
    }

    /// Splits raw text into trimmed, non-empty windows
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.splitter.split(text)
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkerSettings::default())
    }
}
