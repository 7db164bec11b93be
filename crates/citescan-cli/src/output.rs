use std::io::Write;
use std::path::Path;

use citescan_core::{
    CitationMention, CitationStyle, CitationSummary, ExtractionReport, ReferenceListEntry,
    VerificationStatus,
};
use citescan_parsing::ContentStats;
use citescan_reporting::ExportFormat;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a full human-readable report: header, mentions, references, summary.
pub fn print_report(
    w: &mut dyn Write,
    name: &str,
    report: &ExtractionReport,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Scanning".bold().cyan(), name.bold())?;
    } else {
        writeln!(w, "Scanning {}", name)?;
    }
    writeln!(
        w,
        "Found {} citation mentions and {} reference-list entries",
        report.mentions.len(),
        report.references.len()
    )?;
    writeln!(w)?;

    for (i, m) in report.mentions.iter().enumerate() {
        print_mention(w, i + 1, m, color)?;
    }
    if !report.references.is_empty() {
        writeln!(w)?;
        print_references(w, &report.references, color)?;
    }
    writeln!(w)?;
    print_summary(w, &report.summary, color)
}

fn style_label(style: CitationStyle) -> &'static str {
    match style {
        CitationStyle::Apa => "APA",
        CitationStyle::ApaInline => "APA inline",
        CitationStyle::Mla => "MLA",
        CitationStyle::Unknown => "unknown",
    }
}

/// Print one mention with its classification and recovered fields.
pub fn print_mention(
    w: &mut dyn Write,
    num: usize,
    m: &CitationMention,
    color: ColorMode,
) -> std::io::Result<()> {
    let tag = format!("[{}]", num);
    let label = format!("{} {:.1}", style_label(m.style), m.confidence);
    if m.status == VerificationStatus::Unverified {
        if color.enabled() {
            writeln!(w, "{} {} {}", tag.dimmed(), "UNVERIFIED".red().bold(), m.raw_text)?;
        } else {
            writeln!(w, "{} UNVERIFIED {}", tag, m.raw_text)?;
        }
        if let Some(note) = &m.note {
            writeln!(w, "      {}", note)?;
        }
        return Ok(());
    }

    if color.enabled() {
        let label = if m.confidence >= 0.9 {
            label.green().to_string()
        } else if m.confidence >= 0.6 {
            label.cyan().to_string()
        } else {
            label.yellow().to_string()
        };
        writeln!(w, "{} {} ({})", tag.dimmed(), m.raw_text, label)?;
    } else {
        writeln!(w, "{} {} ({})", tag, m.raw_text, label)?;
    }

    if !m.authors.is_empty() {
        let et_al = if m.has_et_al { " et al." } else { "" };
        writeln!(w, "      Authors: {}{}", m.authors.join("; "), et_al)?;
    }
    if let Some(year) = m.year {
        writeln!(w, "      Year: {}", year)?;
    }
    if let Some(title) = &m.title {
        writeln!(w, "      Title: {}", title)?;
    }
    if let Some(doi) = &m.identifiers.doi {
        writeln!(w, "      DOI: {}", doi)?;
    }
    if let Some(pmid) = &m.identifiers.pubmed_id {
        writeln!(w, "      PMID: {}", pmid)?;
    }
    if let Some(arxiv) = &m.identifiers.arxiv_id {
        writeln!(w, "      arXiv: {}", arxiv)?;
    }
    Ok(())
}

pub fn print_references(
    w: &mut dyn Write,
    references: &[ReferenceListEntry],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", "Reference list".bold())?;
    } else {
        writeln!(w, "Reference list")?;
    }
    for r in references {
        writeln!(w, "{:>3}. {}", r.ordinal, r.text)?;
    }
    Ok(())
}

/// Print the status counts line.
pub fn print_summary(
    w: &mut dyn Write,
    s: &CitationSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} total, {} pending, {} verified, {} failed, {}",
            "Summary:".bold(),
            s.total,
            s.pending,
            s.verified.to_string().green(),
            s.failed.to_string().red(),
            format!("{} unverified", s.unverified).yellow(),
        )
    } else {
        writeln!(
            w,
            "Summary: {} total, {} pending, {} verified, {} failed, {} unverified",
            s.total, s.pending, s.verified, s.failed, s.unverified
        )
    }
}

/// Confirmation after a report was exported to a file.
pub fn print_written(
    w: &mut dyn Write,
    path: &Path,
    format: ExportFormat,
    report: &ExtractionReport,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(
        w,
        "Wrote {} report to {}",
        format.label(),
        path.display()
    )?;
    print_summary(w, &report.summary, color)
}

/// Print content statistics for the `analyze` command.
pub fn print_stats(
    w: &mut dyn Write,
    name: &str,
    stats: &ContentStats,
    density: f64,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", name.bold())?;
    } else {
        writeln!(w, "{}", name)?;
    }
    writeln!(w, "  Characters:           {}", stats.characters)?;
    writeln!(w, "  Words:                {}", stats.words)?;
    writeln!(w, "  Sentences:            {}", stats.sentences)?;
    writeln!(w, "  Paragraphs:           {}", stats.paragraphs)?;
    writeln!(w, "  Words per sentence:   {:.1}", stats.average_sentence_words)?;
    writeln!(w, "  Citations / 1k words: {:.1}", density)?;
    if stats.unverified_markers > 0 {
        let msg = format!("  [UNVERIFIED] markers: {}", stats.unverified_markers);
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescan_core::{Detector, ParseBranch, summarize};

    fn render(report: &ExtractionReport) -> String {
        let mut buf = Vec::new();
        print_report(&mut buf, "chapter.txt", report, ColorMode(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_print_report_plain() {
        let mut m = CitationMention::new(
            "(Smith, 2023)",
            0,
            Detector::Cascade,
            ParseBranch::InlineParenthetical,
        );
        m.style = CitationStyle::ApaInline;
        m.authors = vec!["Smith".to_string()];
        m.year = Some(2023);
        let mut marker = CitationMention::new("[UNVERIFIED]", 20, Detector::Marker, ParseBranch::Fallback);
        marker.status = VerificationStatus::Unverified;
        let mentions = vec![m, marker];
        let report = ExtractionReport {
            summary: summarize(&mentions),
            mentions,
            references: vec![],
        };

        let out = render(&report);
        assert!(out.starts_with("Scanning chapter.txt\n"));
        assert!(out.contains("[1] (Smith, 2023) (APA inline 0.6)"));
        assert!(out.contains("      Authors: Smith\n"));
        assert!(out.contains("[2] UNVERIFIED [UNVERIFIED]"));
        assert!(out.contains(
            "Summary: 2 total, 1 pending, 0 verified, 0 failed, 1 unverified"
        ));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_print_stats_plain() {
        let stats = ContentStats {
            words: 1000,
            unverified_markers: 2,
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_stats(&mut buf, "ch1.html", &stats, 3.0, ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Words:                1000"));
        assert!(out.contains("Citations / 1k words: 3.0"));
        assert!(out.contains("[UNVERIFIED] markers: 2"));
    }
}
