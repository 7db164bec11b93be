use thiserror::Error;

pub mod analysis;
pub mod authors;
pub mod bracketed;
pub mod budget;
pub mod classify;
pub mod config;
pub mod extractor;
pub mod identifiers;
pub mod markers;
pub mod section;

pub use analysis::{ContentStats, analyze, citation_density, strip_tags};
pub use authors::{ParsedAuthors, parse_authors, split_author_string};
pub use classify::{Classified, Classifier};
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::CitationExtractor;
pub use section::{extract_reference_list, find_reference_section};
// Re-export domain types from core (canonical definitions live there)
pub use citescan_core::{
    CitationMention, CitationStyle, CitationSummary, ExtractionReport, ReferenceListEntry,
    VerificationStatus, summarize,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("reference heading must not be empty")]
    EmptyHeading,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Detect citation mentions in chapter text with the default configuration.
///
/// Pipeline:
/// 1. Split the text into lines and HTML blocks
/// 2. Per segment, classify spans as full APA, full MLA, `Author (Year)` or
///    `(Author, Year)`, falling back to best-effort field recovery
/// 3. Attach DOIs, PubMed IDs and arXiv IDs found in each segment
/// 4. Add bracketed `(Author, Year)` mentions not already seen
/// 5. Add one `unverified` mention per `[UNVERIFIED]` marker
pub fn extract_mentions(text: &str) -> Vec<CitationMention> {
    CitationExtractor::new().extract_mentions(text)
}
