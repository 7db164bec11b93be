use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::is_initials;

use crate::config::ParsingConfig;

/// A capitalized surname or given name, including diacritics, apostrophes and hyphens.
pub(crate) const NAME: &str = r"\p{Lu}[\p{L}'’\-]+";

/// One or more initials: `J.`, `J. A.`, `J.-P.`
pub(crate) const INITIALS: &str = r"\p{Lu}\.(?:\s?-?\p{Lu}\.)*";

/// Separator between tokens of an author list.
const AUTHOR_SEP: &str = r"(?:\s*,?\s*&\s*|\s*,?\s+and\s+|\s*,\s*|\s+)";

/// Regex fragment matching a run of author tokens: `Smith, J., & Jones, K.`,
/// `Smith, John, and Jane Doe`, `Smith et al.`
pub(crate) fn author_list_pattern() -> String {
    format!(
        r"(?:{NAME}|{INITIALS})(?:{AUTHOR_SEP}(?:{NAME}|{INITIALS}|et\s+al\.?))*",
        NAME = NAME,
        INITIALS = INITIALS,
        AUTHOR_SEP = AUTHOR_SEP,
    )
}

/// Author names parsed from one author segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAuthors {
    pub names: Vec<String>,
    pub has_et_al: bool,
}

static ET_AL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),?\s*\bet\s+al\b\.?").unwrap());

/// Parse an author segment.
///
/// A segment containing `et al.` collapses to a single author string with
/// the token stripped (`Smith et al.` becomes `["Smith"]`). Otherwise the
/// segment is split with [`split_author_string`].
pub fn parse_authors(segment: &str) -> ParsedAuthors {
    parse_authors_with_config(segment, &ParsingConfig::default())
}

/// Config-aware version of [`parse_authors`].
pub(crate) fn parse_authors_with_config(segment: &str, config: &ParsingConfig) -> ParsedAuthors {
    if ET_AL_RE.is_match(segment) {
        let stripped = ET_AL_RE.replace_all(segment, "");
        let name = trim_name(&stripped);
        return ParsedAuthors {
            names: if name.is_empty() {
                vec![]
            } else {
                vec![name.to_string()]
            },
            has_et_al: true,
        };
    }

    let mut names = split_author_string(segment);
    names.truncate(config.max_authors);
    ParsedAuthors {
        names,
        has_et_al: false,
    }
}

/// Split an author string on `,`, `and` or `&`.
///
/// Each part is trimmed of punctuation and whitespace and empty parts are
/// dropped. A part that is only initials is folded into the preceding
/// surname, so `Smith, J., & Jones, K.` yields `["Smith, J", "Jones, K"]`.
pub fn split_author_string(segment: &str) -> Vec<String> {
    static SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*(?:,|&|\band\b)\s*").unwrap());

    let mut authors: Vec<String> = Vec::new();
    for part in SPLIT_RE.split(segment) {
        let part = trim_name(part);
        if part.is_empty() {
            continue;
        }
        let part_is_initials = part.split_whitespace().all(is_initials_loose);
        match authors.last_mut() {
            Some(prev) if part_is_initials && !prev.contains(',') => {
                prev.push_str(", ");
                prev.push_str(part);
            }
            _ => authors.push(part.to_string()),
        }
    }
    authors
}

/// Initials with their trailing period already trimmed (`J`, `J.-P`, `AB`).
fn is_initials_loose(token: &str) -> bool {
    is_initials(token) || is_initials(&format!("{token}."))
}

fn trim_name(s: &str) -> &str {
    s.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '(' | ')' | '"' | '“' | '”' | '[' | ']')
    })
}

/// Leading run of capitalized name tokens at the start of `text`.
///
/// Returns `None` when the text does not start with a name, or starts with
/// a word from the configured stop list (`The`, `In`, ...).
pub(crate) fn leading_name_run<'a>(text: &'a str, config: &ParsingConfig) -> Option<&'a str> {
    static LEADING_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"^(?:{NAME}|{INITIALS})(?:{AUTHOR_SEP}(?:{NAME}|{INITIALS}|et\s+al\.?))*",
            NAME = NAME,
            INITIALS = INITIALS,
            AUTHOR_SEP = r"(?:\s*,?\s*&\s*|\s*,?\s+and\s+|\s*,\s*)",
        ))
        .unwrap()
    });

    let m = LEADING_RE.find(text)?;
    let first_word = m.as_str().split([' ', ',']).next().unwrap_or("");
    if config.is_name_stopword(first_word) {
        return None;
    }
    Some(m.as_str())
}

/// Whether every name in `names` looks like a person or organization name.
pub(crate) fn plausible_names(names: &[String], config: &ParsingConfig) -> bool {
    !names.is_empty()
        && names.iter().all(|n| {
            n.chars().next().is_some_and(|c| c.is_uppercase())
                && !n.chars().any(|c| c.is_ascii_digit())
                && !config.is_name_stopword(n.split_whitespace().next().unwrap_or(""))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_comma() {
        assert_eq!(split_author_string("Smith, Jones, Lee"), vec!["Smith", "Jones", "Lee"]);
    }

    #[test]
    fn test_split_on_and() {
        assert_eq!(split_author_string("Smith and Jones"), vec!["Smith", "Jones"]);
    }

    #[test]
    fn test_split_on_ampersand() {
        assert_eq!(split_author_string("Smith & Jones"), vec!["Smith", "Jones"]);
    }

    #[test]
    fn test_split_folds_initials() {
        assert_eq!(
            split_author_string("Smith, J., & Jones, K. L."),
            vec!["Smith, J", "Jones, K. L"]
        );
    }

    #[test]
    fn test_split_drops_empty_parts() {
        assert_eq!(split_author_string("Smith, , & Jones,"), vec!["Smith", "Jones"]);
        assert!(split_author_string(" , ").is_empty());
    }

    #[test]
    fn test_split_does_not_break_inside_words() {
        assert_eq!(split_author_string("Anderson & Sandberg"), vec!["Anderson", "Sandberg"]);
    }

    #[test]
    fn test_parse_authors_et_al_collapses() {
        let parsed = parse_authors("Smith et al.");
        assert_eq!(parsed.names, vec!["Smith"]);
        assert!(parsed.has_et_al);
    }

    #[test]
    fn test_parse_authors_et_al_keeps_single_string() {
        let parsed = parse_authors("Smith and Jones et al.");
        assert_eq!(parsed.names, vec!["Smith and Jones"]);
        assert!(parsed.has_et_al);
    }

    #[test]
    fn test_parse_authors_truncates_to_max() {
        let config = crate::ParsingConfigBuilder::new().max_authors(2).build().unwrap();
        let parsed = parse_authors_with_config("Ames, Baker, Cole, Dunn", &config);
        assert_eq!(parsed.names, vec!["Ames", "Baker"]);
    }

    #[test]
    fn test_leading_name_run() {
        let config = ParsingConfig::default();
        assert_eq!(
            leading_name_run("Smith, J., & Jones, K. \"A title\" 2020", &config),
            Some("Smith, J., & Jones, K.")
        );
    }

    #[test]
    fn test_leading_name_run_rejects_stopword() {
        let config = ParsingConfig::default();
        assert_eq!(leading_name_run("The results in 2020", &config), None);
        assert_eq!(leading_name_run("lowercase start", &config), None);
    }

    #[test]
    fn test_plausible_names() {
        let config = ParsingConfig::default();
        assert!(plausible_names(&["Smith".into()], &config));
        assert!(!plausible_names(&["see Smith".into()], &config));
        assert!(!plausible_names(&["In".into()], &config));
        assert!(!plausible_names(&[], &config));
    }
}
