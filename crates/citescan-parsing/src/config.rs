use std::time::Duration;

use regex::Regex;

use citescan_core::config_file::ParsingSection;

use crate::ParsingError;

/// Reference-list headings tried in priority order.
pub const DEFAULT_REFERENCE_HEADINGS: &[&str] = &["References", "Bibliography", "Works Cited"];

/// Capitalized words that start sentences but are never author names.
pub const DEFAULT_NAME_STOPWORDS: &[&str] = &[
    "A", "According", "After", "Also", "An", "And", "As", "At", "Before", "But", "By", "During",
    "Figure", "For", "From", "However", "If", "In", "It", "Its", "Note", "Of", "On", "See", "Since",
    "Table", "That", "The", "These", "This", "Those", "Thus", "To", "Until", "We", "When",
    "While", "With",
];

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Configuration for the citation extraction pipeline.
///
/// Use [`ParsingConfigBuilder`] to construct with custom headings or limits.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── section.rs ──
    /// Compiled heading regexes in priority order. `None` means the built-in headings.
    pub(crate) heading_res: Option<Vec<Regex>>,
    /// Reference-list lines of this many characters or fewer are dropped (default: 20).
    pub(crate) min_reference_chars: usize,

    // ── authors.rs ──
    /// Maximum number of authors to retain per mention (default: 25).
    pub(crate) max_authors: usize,
    /// Words that are never read as the first author name.
    pub(crate) name_stopwords: Vec<String>,

    // ── budget.rs ──
    pub(crate) budget_base: Duration,
    pub(crate) budget_per_kib: Duration,
    pub(crate) enforce_budget: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            heading_res: None,
            min_reference_chars: 20,
            max_authors: 25,
            name_stopwords: DEFAULT_NAME_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            budget_base: Duration::from_millis(250),
            budget_per_kib: Duration::from_millis(20),
            enforce_budget: true,
        }
    }
}

impl ParsingConfig {
    pub fn min_reference_chars(&self) -> usize {
        self.min_reference_chars
    }

    pub fn max_authors(&self) -> usize {
        self.max_authors
    }

    pub(crate) fn is_name_stopword(&self, word: &str) -> bool {
        self.name_stopwords.iter().any(|s| s == word)
    }

    /// Processing time allowed for an input of `len` bytes, or `None` when unbounded.
    pub fn time_budget(&self, len: usize) -> Option<Duration> {
        if !self.enforce_budget {
            return None;
        }
        let kib = len.div_ceil(1024) as u32;
        Some(self.budget_base + self.budget_per_kib * kib)
    }
}

/// Builds the anchored, case-sensitive regex for one reference-list heading.
///
/// The heading must sit on its own line, optionally wrapped in markup
/// (`## References`, `<h2>References</h2>`) or followed by a colon.
pub(crate) fn heading_regex(heading: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?m)^[ \t]*(?:<[^>\n]+>[ \t]*)*(?:#+[ \t]*)?{}[ \t]*:?[ \t]*(?:</[^>\n]+>[ \t]*)*\r?\n",
        regex::escape(heading)
    ))
}

/// Builder for [`ParsingConfig`].
///
/// Heading names are compiled to `Regex` in [`build()`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    reference_headings: ListOverride<String>,
    name_stopwords: ListOverride<String>,
    min_reference_chars: Option<usize>,
    max_authors: Option<usize>,
    budget_base: Option<Duration>,
    budget_per_kib: Option<Duration>,
    enforce_budget: Option<bool>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `[parsing]` section of an on-disk config file.
    pub fn from_config_file(section: &ParsingSection) -> Self {
        let mut builder = Self::new();
        if let Some(n) = section.min_reference_chars {
            builder = builder.min_reference_chars(n);
        }
        if let Some(n) = section.max_authors {
            builder = builder.max_authors(n);
        }
        if let Some(headings) = &section.reference_headings {
            builder = builder.set_reference_headings(headings.clone());
        }
        if let Some(words) = &section.extra_name_stopwords {
            for w in words {
                builder = builder.add_name_stopword(w.clone());
            }
        }
        if let Some(ms) = section.budget_base_ms {
            builder = builder.budget_base(Duration::from_millis(ms));
        }
        if let Some(ms) = section.budget_ms_per_kib {
            builder = builder.budget_per_kib(Duration::from_millis(ms));
        }
        builder
    }

    // ── Reference-list headings ──

    pub fn set_reference_headings(mut self, headings: Vec<String>) -> Self {
        self.reference_headings = ListOverride::Replace(headings);
        self
    }

    pub fn add_reference_heading(mut self, heading: String) -> Self {
        match &mut self.reference_headings {
            ListOverride::Extend(v) => v.push(heading),
            _ => self.reference_headings = ListOverride::Extend(vec![heading]),
        }
        self
    }

    // ── Name stopwords ──

    pub fn set_name_stopwords(mut self, words: Vec<String>) -> Self {
        self.name_stopwords = ListOverride::Replace(words);
        self
    }

    pub fn add_name_stopword(mut self, word: String) -> Self {
        match &mut self.name_stopwords {
            ListOverride::Extend(v) => v.push(word),
            _ => self.name_stopwords = ListOverride::Extend(vec![word]),
        }
        self
    }

    // ── Scalars ──

    pub fn min_reference_chars(mut self, n: usize) -> Self {
        self.min_reference_chars = Some(n);
        self
    }

    pub fn max_authors(mut self, n: usize) -> Self {
        self.max_authors = Some(n);
        self
    }

    // ── Budget ──

    pub fn budget_base(mut self, d: Duration) -> Self {
        self.budget_base = Some(d);
        self
    }

    pub fn budget_per_kib(mut self, d: Duration) -> Self {
        self.budget_per_kib = Some(d);
        self
    }

    pub fn enforce_budget(mut self, enforce: bool) -> Self {
        self.enforce_budget = Some(enforce);
        self
    }

    /// Compile heading names into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, ParsingError> {
        let defaults = ParsingConfig::default();

        let heading_res = match &self.reference_headings {
            ListOverride::Default => None,
            other => {
                let names = other.resolve(
                    &DEFAULT_REFERENCE_HEADINGS
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>(),
                );
                if names.iter().any(|n| n.trim().is_empty()) {
                    return Err(ParsingError::EmptyHeading);
                }
                let res: Result<Vec<_>, _> = names.iter().map(|n| heading_regex(n.trim())).collect();
                Some(res?)
            }
        };

        Ok(ParsingConfig {
            heading_res,
            min_reference_chars: self
                .min_reference_chars
                .unwrap_or(defaults.min_reference_chars),
            max_authors: self.max_authors.unwrap_or(defaults.max_authors),
            name_stopwords: self.name_stopwords.resolve(&defaults.name_stopwords),
            budget_base: self.budget_base.unwrap_or(defaults.budget_base),
            budget_per_kib: self.budget_per_kib.unwrap_or(defaults.budget_per_kib),
            enforce_budget: self.enforce_budget.unwrap_or(defaults.enforce_budget),
        })
    }
}
