use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config_file;
pub mod dedup;
pub mod summary;

// Re-export for convenience
pub use dedup::{DeduplicationKey, canonical_author, is_initials};
pub use summary::{CitationSummary, HasStatus, summarize};

/// Citation style a mention was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    /// Full APA reference: `Author (Year). Title. Journal, Vol(Issue), Pages.`
    Apa,
    /// In-text APA form, either `Author (Year)` or `(Author, Year)`.
    ApaInline,
    /// Full MLA reference: `Author. "Title." Journal, vol. N, no. N, Year, pp. Pages`
    Mla,
    Unknown,
}

impl CitationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apa => "apa",
            Self::ApaInline => "apa_inline",
            Self::Mla => "mla",
            Self::Unknown => "unknown",
        }
    }
}

/// Lifecycle state used by the downstream verification service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Failed,
    Unverified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Unverified => "unverified",
        }
    }
}

/// The parse branch that set a mention's confidence.
///
/// Ordered from strongest to weakest signal. Each branch has a fixed
/// confidence floor; a mention's confidence is the floor of the strongest
/// branch that succeeded on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseBranch {
    /// A DOI, PubMed ID or arXiv ID was found.
    Identified,
    /// A complete APA or MLA reference matched.
    FullBibliographic,
    /// An `Author (Year)` or `(Author, Year)` in-text form matched.
    InlineParenthetical,
    /// Best-effort recovery of whatever fields could be found.
    Fallback,
}

impl ParseBranch {
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Identified => 0.9,
            Self::FullBibliographic => 0.7,
            Self::InlineParenthetical => 0.6,
            Self::Fallback => 0.3,
        }
    }
}

/// Which extraction stage produced a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detector {
    /// The classifier cascade (identifiers, full forms, inline forms, fallback).
    Cascade,
    /// The bracketed `(Author, Year)` family scan.
    Bracketed,
    /// A literal `[UNVERIFIED]` marker left by the generator.
    Marker,
}

/// Structured, independently verifiable reference keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub doi: Option<String>,
    pub pubmed_id: Option<String>,
    pub arxiv_id: Option<String>,
}

impl Identifiers {
    pub fn is_empty(&self) -> bool {
        self.doi.is_none() && self.pubmed_id.is_none() && self.arxiv_id.is_none()
    }

    /// Fill any unset field from `other`. Fields already set are kept.
    pub fn merge_missing(&mut self, other: Identifiers) {
        if self.doi.is_none() {
            self.doi = other.doi;
        }
        if self.pubmed_id.is_none() {
            self.pubmed_id = other.pubmed_id;
        }
        if self.arxiv_id.is_none() {
            self.arxiv_id = other.arxiv_id;
        }
    }
}

/// A single in-text occurrence of a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationMention {
    /// The exact matched substring.
    pub raw_text: String,
    /// Byte offset of `raw_text` in the input.
    pub offset: usize,
    pub style: CitationStyle,
    pub authors: Vec<String>,
    pub year: Option<u16>,
    pub has_et_al: bool,
    pub identifiers: Identifiers,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub confidence: f64,
    pub branch: ParseBranch,
    pub detector: Detector,
    pub status: VerificationStatus,
    pub note: Option<String>,
}

impl CitationMention {
    /// Create an empty mention whose confidence is the floor of `branch`.
    pub fn new(
        raw_text: impl Into<String>,
        offset: usize,
        detector: Detector,
        branch: ParseBranch,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            offset,
            style: CitationStyle::Unknown,
            authors: Vec::new(),
            year: None,
            has_et_al: false,
            identifiers: Identifiers::default(),
            title: None,
            journal: None,
            volume: None,
            issue: None,
            pages: None,
            confidence: branch.confidence(),
            branch,
            detector,
            status: VerificationStatus::Pending,
            note: None,
        }
    }

    /// Raise confidence to the floor of `branch` if that is a stronger signal.
    ///
    /// Never lowers confidence.
    pub fn raise_to(&mut self, branch: ParseBranch) {
        if branch.confidence() > self.confidence {
            self.confidence = branch.confidence();
            self.branch = branch;
        }
    }

    /// Attach identifiers found for this mention, raising confidence when any are present.
    pub fn attach_identifiers(&mut self, ids: Identifiers) {
        let found = !ids.is_empty();
        self.identifiers.merge_missing(ids);
        if found {
            self.raise_to(ParseBranch::Identified);
        }
    }

    /// Key used to suppress duplicate in-text mentions.
    pub fn dedup_key(&self) -> DeduplicationKey {
        DeduplicationKey::from_mention(self)
    }

    /// Whether this is an in-text mention (as opposed to a full reference).
    pub fn is_in_text(&self) -> bool {
        self.style == CitationStyle::ApaInline
    }
}

/// A line extracted from a detected References/Bibliography/Works Cited section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceListEntry {
    /// 1-based position within the detected section.
    pub ordinal: usize,
    pub text: String,
    pub status: VerificationStatus,
}

/// Everything produced from one input text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub mentions: Vec<CitationMention>,
    pub references: Vec<ReferenceListEntry>,
    pub summary: CitationSummary,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}
