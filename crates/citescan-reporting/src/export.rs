use std::io::Write;
use std::path::Path;

use citescan_core::{CitationMention, CitationSummary, ExtractionReport, ReferenceListEntry};

use crate::{ExportFormat, ReportError};

/// Render `report` in `format` and write it to `path`.
pub fn export_report(
    report: &ExtractionReport,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ReportError> {
    let content = render(report, format)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Render `report` as a string in `format`.
pub fn render(report: &ExtractionReport, format: ExportFormat) -> Result<String, ReportError> {
    Ok(match format {
        ExportFormat::Json => {
            let mut s = serde_json::to_string_pretty(report)?;
            s.push('\n');
            s
        }
        ExportFormat::Csv => export_csv(report),
        ExportFormat::Markdown => export_markdown(report),
        ExportFormat::Text => export_text(report),
    })
}

fn summary_line(s: &CitationSummary) -> String {
    format!(
        "{} total | {} pending | {} verified | {} failed | {} unverified | {:.1}% problematic",
        s.total,
        s.pending,
        s.verified,
        s.failed,
        s.unverified,
        s.problematic_pct(),
    )
}

fn year_str(m: &CitationMention) -> String {
    m.year.map(|y| y.to_string()).unwrap_or_default()
}

fn authors_str(m: &CitationMention) -> String {
    let mut s = m.authors.join("; ");
    if m.has_et_al {
        s.push_str(" et al.");
    }
    s
}

// ── CSV ─────────────────────────────────────────────────────────────

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn export_csv(report: &ExtractionReport) -> String {
    let mut out = String::from(
        "Kind,Ordinal,Style,Status,Confidence,Authors,Year,EtAl,Title,Journal,DOI,PMID,arXiv,Raw\n",
    );
    for (i, m) in report.mentions.iter().enumerate() {
        out.push_str(&format!(
            "mention,{},{},{},{:.1},{},{},{},{},{},{},{},{},{}\n",
            i + 1,
            m.style.as_str(),
            m.status.as_str(),
            m.confidence,
            csv_escape(&authors_str(m)),
            year_str(m),
            m.has_et_al,
            csv_escape(m.title.as_deref().unwrap_or("")),
            csv_escape(m.journal.as_deref().unwrap_or("")),
            csv_escape(m.identifiers.doi.as_deref().unwrap_or("")),
            csv_escape(m.identifiers.pubmed_id.as_deref().unwrap_or("")),
            csv_escape(m.identifiers.arxiv_id.as_deref().unwrap_or("")),
            csv_escape(&m.raw_text),
        ));
    }
    for r in &report.references {
        out.push_str(&format!(
            "reference,{},,{},,,,,,,,,,{}\n",
            r.ordinal,
            r.status.as_str(),
            csv_escape(&r.text),
        ));
    }
    out
}

// ── Markdown ────────────────────────────────────────────────────────

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

fn export_markdown(report: &ExtractionReport) -> String {
    let mut out = String::from("# Citation Report\n\n");
    out.push_str(&format!("**{}**\n\n", summary_line(&report.summary)));

    out.push_str("## Mentions\n\n");
    if report.mentions.is_empty() {
        out.push_str("_No citation mentions found._\n\n");
    } else {
        out.push_str("| # | Style | Status | Confidence | Authors | Year | Identifiers | Text |\n");
        out.push_str("|---|-------|--------|------------|---------|------|-------------|------|\n");
        for (i, m) in report.mentions.iter().enumerate() {
            out.push_str(&format!(
                "| {} | {} | {} | {:.1} | {} | {} | {} | `{}` |\n",
                i + 1,
                m.style.as_str(),
                m.status.as_str(),
                m.confidence,
                md_escape(&authors_str(m)),
                year_str(m),
                md_escape(&identifiers_str(m)),
                md_escape(&m.raw_text).replace('`', "'"),
            ));
        }
        out.push('\n');
    }

    write_md_references(&mut out, &report.references);
    out
}

fn write_md_references(out: &mut String, references: &[ReferenceListEntry]) {
    out.push_str("## Reference List\n\n");
    if references.is_empty() {
        out.push_str("_No reference list detected._\n");
        return;
    }
    for r in references {
        out.push_str(&format!("{}. {} _({})_\n", r.ordinal, r.text, r.status.as_str()));
    }
}

fn identifiers_str(m: &CitationMention) -> String {
    let mut parts = Vec::new();
    if let Some(doi) = &m.identifiers.doi {
        parts.push(format!("DOI {doi}"));
    }
    if let Some(pmid) = &m.identifiers.pubmed_id {
        parts.push(format!("PMID {pmid}"));
    }
    if let Some(arxiv) = &m.identifiers.arxiv_id {
        parts.push(format!("arXiv {arxiv}"));
    }
    parts.join(", ")
}

// ── Plain text ──────────────────────────────────────────────────────

fn export_text(report: &ExtractionReport) -> String {
    let mut out = String::from("Citation Report\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!("  {}\n\n", summary_line(&report.summary)));

    out.push_str(&format!("Mentions ({})\n", report.mentions.len()));
    out.push_str(&"-".repeat(60));
    out.push('\n');
    for (i, m) in report.mentions.iter().enumerate() {
        out.push_str(&format!(
            "[{}] {} ({}, {:.1})\n",
            i + 1,
            m.raw_text,
            m.style.as_str(),
            m.confidence,
        ));
        if !m.authors.is_empty() || m.year.is_some() {
            out.push_str(&format!("    Authors: {}  Year: {}\n", authors_str(m), year_str(m)));
        }
        if let Some(title) = &m.title {
            out.push_str(&format!("    Title: {title}\n"));
        }
        let ids = identifiers_str(m);
        if !ids.is_empty() {
            out.push_str(&format!("    {ids}\n"));
        }
        if let Some(note) = &m.note {
            out.push_str(&format!("    Note: {note}\n"));
        }
    }

    out.push_str(&format!("\nReference List ({})\n", report.references.len()));
    out.push_str(&"-".repeat(60));
    out.push('\n');
    for r in &report.references {
        out.push_str(&format!("{:>3}. {}\n", r.ordinal, r.text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescan_core::{
        CitationStyle, Detector, ParseBranch, VerificationStatus, summarize,
    };

    // ── helpers ──────────────────────────────────────────────────────

    fn make_mention(raw: &str, authors: &[&str], year: u16) -> CitationMention {
        let mut m = CitationMention::new(raw, 0, Detector::Cascade, ParseBranch::InlineParenthetical);
        m.style = CitationStyle::ApaInline;
        m.authors = authors.iter().map(|a| a.to_string()).collect();
        m.year = Some(year);
        m
    }

    fn make_report() -> ExtractionReport {
        let mut full = CitationMention::new(
            "Smith, J. (2020). A Study, of Things. Journal, 5(2), 1-2.",
            40,
            Detector::Cascade,
            ParseBranch::FullBibliographic,
        );
        full.style = CitationStyle::Apa;
        full.authors = vec!["Smith, J".to_string()];
        full.year = Some(2020);
        full.title = Some("A Study, of Things".to_string());
        full.attach_identifiers(citescan_core::Identifiers {
            doi: Some("10.1000/182".to_string()),
            ..Default::default()
        });

        let mut marker = CitationMention::new("[UNVERIFIED]", 90, Detector::Marker, ParseBranch::Fallback);
        marker.status = VerificationStatus::Unverified;
        marker.note = Some("flagged".to_string());

        let mentions = vec![make_mention("(Smith | Co, 2023)", &["Smith | Co"], 2023), full, marker];
        let references = vec![ReferenceListEntry {
            ordinal: 1,
            text: "Smith, J. (2020). A Study of Things.".to_string(),
            status: VerificationStatus::Pending,
        }];
        ExtractionReport {
            summary: summarize(&mentions),
            mentions,
            references,
        }
    }

    // ── CSV ──────────────────────────────────────────────────────────

    #[test]
    fn test_csv_header_and_rows() {
        let csv = render(&make_report(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Kind,Ordinal,Style,Status,Confidence,Authors,Year,EtAl,Title,Journal,DOI,PMID,arXiv,Raw"
        );
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("mention,1,apa_inline,pending,0.6,"));
        assert!(lines[2].contains("0.9"));
        assert!(lines[2].contains("\"A Study, of Things\""));
        assert!(lines[2].contains("10.1000/182"));
        assert!(lines[3].starts_with("mention,3,unknown,unverified,0.3,"));
        assert!(lines[4].starts_with("reference,1,,pending,"));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    // ── JSON ─────────────────────────────────────────────────────────

    #[test]
    fn test_json_is_parseable() {
        let json = render(&make_report(), ExportFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["summary"]["total"], 3);
        assert_eq!(v["summary"]["unverified"], 1);
        assert_eq!(v["mentions"][0]["style"], "apa_inline");
        assert_eq!(v["mentions"][1]["identifiers"]["doi"], "10.1000/182");
        assert_eq!(v["references"][0]["status"], "pending");
    }

    // ── Markdown ─────────────────────────────────────────────────────

    #[test]
    fn test_markdown_escapes_pipes() {
        let md = render(&make_report(), ExportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Citation Report\n"));
        assert!(md.contains("Smith \\| Co"));
        assert!(md.contains("DOI 10.1000/182"));
        assert!(md.contains("1. Smith, J. (2020). A Study of Things. _(pending)_"));
    }

    #[test]
    fn test_markdown_empty_report() {
        let md = render(&ExtractionReport::default(), ExportFormat::Markdown).unwrap();
        assert!(md.contains("_No citation mentions found._"));
        assert!(md.contains("_No reference list detected._"));
    }

    // ── Text ─────────────────────────────────────────────────────────

    #[test]
    fn test_text_lists_everything() {
        let text = render(&make_report(), ExportFormat::Text).unwrap();
        assert!(text.contains("3 total | 2 pending | 0 verified | 0 failed | 1 unverified"));
        assert!(text.contains("Mentions (3)"));
        assert!(text.contains("Note: flagged"));
        assert!(text.contains("  1. Smith, J. (2020)"));
    }

    // ── File export ──────────────────────────────────────────────────

    #[test]
    fn test_export_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        export_report(&make_report(), ExportFormat::Csv, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Kind,Ordinal"));
    }

    #[test]
    fn test_export_report_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let result = export_report(&make_report(), ExportFormat::Json, &path);
        assert!(matches!(result, Err(ReportError::Io(_))));
    }
}
