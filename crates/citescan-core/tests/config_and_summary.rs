//! Integration tests for the on-disk config layer and status summaries.

use citescan_core::config_file::{
    ConfigFile, OutputSection, ParsingSection, merge, save_to_path, try_load_from_path,
};
use citescan_core::{
    CitationMention, CoreError, DeduplicationKey, Detector, ParseBranch, ReferenceListEntry,
    VerificationStatus, summarize,
};

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = ConfigFile {
        parsing: Some(ParsingSection {
            min_reference_chars: Some(30),
            reference_headings: Some(vec!["Sources".into(), "References".into()]),
            ..Default::default()
        }),
        output: Some(OutputSection {
            format: Some("csv".into()),
            color: Some(false),
        }),
    };
    save_to_path(&config, &path).unwrap();

    let loaded = try_load_from_path(&path).unwrap();
    let parsing = loaded.parsing.unwrap();
    assert_eq!(parsing.min_reference_chars, Some(30));
    assert_eq!(
        parsing.reference_headings,
        Some(vec!["Sources".to_string(), "References".to_string()])
    );
    assert_eq!(parsing.max_authors, None);
    assert_eq!(loaded.output.unwrap().format.as_deref(), Some("csv"));
}

#[test]
fn project_file_overrides_platform_file() {
    let dir = tempfile::tempdir().unwrap();
    let platform_path = dir.path().join("platform.toml");
    let project_path = dir.path().join(".citescan.toml");
    std::fs::write(
        &platform_path,
        "[parsing]\nmin_reference_chars = 10\nmax_authors = 5\n\n[output]\nformat = \"json\"\n",
    )
    .unwrap();
    std::fs::write(&project_path, "[parsing]\nmin_reference_chars = 40\n").unwrap();

    let merged = merge(
        try_load_from_path(&platform_path).unwrap(),
        try_load_from_path(&project_path).unwrap(),
    );
    let parsing = merged.parsing.unwrap();
    assert_eq!(parsing.min_reference_chars, Some(40));
    assert_eq!(parsing.max_authors, Some(5));
    assert_eq!(merged.output.unwrap().format.as_deref(), Some("json"));
}

#[test]
fn malformed_config_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[parsing\nmin_reference_chars = ").unwrap();
    assert!(matches!(
        try_load_from_path(&path),
        Err(CoreError::ConfigParse(_))
    ));
}

#[test]
fn summary_over_mentions_and_entries() {
    let mut mentions: Vec<CitationMention> = (0..4)
        .map(|i| CitationMention::new("m", i, Detector::Cascade, ParseBranch::Fallback))
        .collect();
    mentions[1].status = VerificationStatus::Failed;
    mentions[3].status = VerificationStatus::Unverified;
    let s = summarize(&mentions);
    assert_eq!((s.total, s.pending, s.verified, s.failed, s.unverified), (4, 2, 0, 1, 1));
    assert!((s.problematic_pct() - 50.0).abs() < 1e-9);

    let entries = vec![ReferenceListEntry {
        ordinal: 1,
        text: "Smith, J. (2020). A Study of Things.".into(),
        status: VerificationStatus::Verified,
    }];
    let s = summarize(&entries);
    assert_eq!((s.total, s.verified), (1, 1));
}

#[test]
fn dedup_key_normalizes_author_spelling() {
    let a = DeduplicationKey::new(&["Smith, J.".to_string()], false, Some(2020));
    let b = DeduplicationKey::new(&["Smith".to_string()], false, Some(2020));
    let c = DeduplicationKey::new(&["Smith".to_string(), "Jones".to_string()], false, Some(2020));
    let d = DeduplicationKey::new(&["Smith".to_string()], true, Some(2020));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}
