use serde::{Deserialize, Serialize};

use crate::CitationMention;

/// `(author, year)` pair used to suppress duplicate in-text mentions.
///
/// `author` is the canonical form of the whole author list, so
/// `(Smith & Jones, 2023)` and `(Smith, 2023)` produce different keys while
/// `Smith, J.` and `Smith` produce the same one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeduplicationKey {
    pub author: String,
    pub year: Option<u16>,
}

impl DeduplicationKey {
    pub fn new(authors: &[String], has_et_al: bool, year: Option<u16>) -> Self {
        let mut author = authors
            .iter()
            .map(|a| canonical_author(a))
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(" & ");
        if has_et_al {
            author.push_str(" et al");
        }
        Self { author, year }
    }

    pub fn from_mention(mention: &CitationMention) -> Self {
        Self::new(&mention.authors, mention.has_et_al, mention.year)
    }
}

/// Reduce an author string to the form used for duplicate detection.
///
/// - `Surname, Given` keeps only the part before the first comma
/// - initials (`J.`, `J.-P.`, `AB`) and `et al.` are dropped
/// - the result is lowercased with punctuation removed
///
/// `Smith, J.`, `Smith J.` and `Smith` all reduce to `smith`.
pub fn canonical_author(author: &str) -> String {
    let surname_part = author.split(',').next().unwrap_or("");

    let mut words: Vec<String> = Vec::new();
    let tokens: Vec<&str> = surname_part.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i];
        if tok.eq_ignore_ascii_case("et")
            && tokens.get(i + 1).is_some_and(|n| n.starts_with("al"))
        {
            i += 2;
            continue;
        }
        if !is_initials(tok) {
            let cleaned: String = tok
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '\'')
                .flat_map(char::to_lowercase)
                .collect();
            if !cleaned.is_empty() {
                words.push(cleaned);
            }
        }
        i += 1;
    }

    words.join(" ")
}

/// Whether a token is just initials: `J.`, `J.-P.`, `A.B.`, `JA`.
pub fn is_initials(token: &str) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() || !letters.iter().all(|c| c.is_uppercase()) {
        return false;
    }
    let all_initial_chars = token
        .chars()
        .all(|c| c.is_uppercase() || c == '.' || c == '-');
    all_initial_chars && (letters.len() <= 2 || token.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_author_plain() {
        assert_eq!(canonical_author("Smith"), "smith");
    }

    #[test]
    fn test_canonical_author_with_initials() {
        assert_eq!(canonical_author("Smith, J."), "smith");
        assert_eq!(canonical_author("Smith J"), "smith");
        assert_eq!(canonical_author("Smith, J.-P."), "smith");
    }

    #[test]
    fn test_canonical_author_organization() {
        assert_eq!(
            canonical_author("World Health Organization"),
            "world health organization"
        );
    }

    #[test]
    fn test_canonical_author_strips_et_al() {
        assert_eq!(canonical_author("Smith et al."), "smith");
    }

    #[test]
    fn test_canonical_author_keeps_hyphenated_surname() {
        assert_eq!(canonical_author("Garcia-Lopez"), "garcia-lopez");
    }

    #[test]
    fn test_key_distinguishes_author_lists() {
        let single = DeduplicationKey::new(&["Smith".into()], false, Some(2023));
        let pair = DeduplicationKey::new(&["Smith".into(), "Jones".into()], false, Some(2023));
        assert_ne!(single, pair);
    }

    #[test]
    fn test_key_merges_spelling_variants() {
        let a = DeduplicationKey::new(&["Smith, J.".into()], false, Some(2023));
        let b = DeduplicationKey::new(&["Smith".into()], false, Some(2023));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_separates_et_al() {
        let a = DeduplicationKey::new(&["Smith".into()], true, Some(2020));
        let b = DeduplicationKey::new(&["Smith".into()], false, Some(2020));
        assert_ne!(a, b);
        assert_eq!(a.author, "smith et al");
    }

    #[test]
    fn test_is_initials() {
        assert!(is_initials("J."));
        assert!(is_initials("J.-P."));
        assert!(is_initials("AB"));
        assert!(!is_initials("Smith"));
        assert!(!is_initials("WHO"));
        assert!(is_initials("W.H.O."));
    }
}
