use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use citescan_core::config_file::{self, ConfigFile};
use citescan_core::{ExtractionReport, summarize};
use citescan_parsing::{CitationExtractor, ParsingConfigBuilder, analysis};
use citescan_reporting::{ExportFormat, export_report, render};

mod output;

use output::ColorMode;

/// Citation scanner - extract and summarize citations in thesis chapters
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract citation mentions and the reference list from a chapter
    Extract {
        /// Path to the chapter text or HTML file (`-` reads stdin)
        file_path: PathBuf,

        /// Strip HTML tags before extraction
        #[arg(long)]
        strip_html: bool,

        /// Only extract the reference list
        #[arg(long)]
        references_only: bool,

        /// Report format: text, json, csv or markdown
        #[arg(long)]
        format: Option<String>,

        /// Write the report to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Drop reference-list lines of this many characters or fewer
        #[arg(long)]
        min_reference_chars: Option<usize>,

        /// Config file to use instead of the default locations
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print word, sentence and paragraph statistics and citation density
    Analyze {
        /// Path to the chapter text or HTML file (`-` reads stdin)
        file_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Config file to use instead of the default locations
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file_path,
            strip_html,
            references_only,
            format,
            output,
            no_color,
            min_reference_chars,
            config,
        } => extract(
            &file_path,
            strip_html,
            references_only,
            format,
            output,
            no_color,
            min_reference_chars,
            config,
        ),
        Command::Analyze {
            file_path,
            no_color,
            config,
        } => analyze(&file_path, no_color, config),
    }
}

/// Log to stderr so reports on stdout stay clean. `CITESCAN_LOG` takes an
/// `EnvFilter` directive; the default is `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CITESCAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .ok();
}

fn read_input(file_path: &Path) -> anyhow::Result<String> {
    if file_path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    Ok(std::fs::read_to_string(file_path)?)
}

fn display_name(file_path: &Path) -> String {
    if file_path.as_os_str() == "-" {
        return "<stdin>".to_string();
    }
    file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string())
}

fn load_config_file(path: Option<&Path>) -> anyhow::Result<ConfigFile> {
    match path {
        Some(p) => Ok(config_file::try_load_from_path(p)?),
        None => Ok(config_file::load_config()),
    }
}

/// Build the extractor from the config file's `[parsing]` section, with
/// CLI flag overrides applied on top.
fn build_extractor(
    file_config: &ConfigFile,
    min_reference_chars: Option<usize>,
) -> anyhow::Result<CitationExtractor> {
    let mut builder = file_config
        .parsing
        .as_ref()
        .map(ParsingConfigBuilder::from_config_file)
        .unwrap_or_default();
    if let Some(n) = min_reference_chars {
        builder = builder.min_reference_chars(n);
    }
    Ok(CitationExtractor::with_config(builder.build()?))
}

fn color_mode(file_config: &ConfigFile, no_color: bool) -> bool {
    let config_color = file_config
        .output
        .as_ref()
        .and_then(|o| o.color)
        .unwrap_or(true);
    config_color && !no_color
}

/// Resolve the report format: CLI flag > `CITESCAN_FORMAT` > config file > text.
fn resolve_format(flag: Option<String>, file: &ConfigFile) -> anyhow::Result<ExportFormat> {
    let chosen = flag
        .or_else(|| std::env::var("CITESCAN_FORMAT").ok())
        .or_else(|| file.output.as_ref().and_then(|o| o.format.clone()));
    match chosen {
        Some(s) => Ok(s.parse()?),
        None => Ok(ExportFormat::Text),
    }
}

#[allow(clippy::too_many_arguments)]
fn extract(
    file_path: &Path,
    strip_html: bool,
    references_only: bool,
    format: Option<String>,
    output: Option<PathBuf>,
    no_color: bool,
    min_reference_chars: Option<usize>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let file_config = load_config_file(config.as_deref())?;
    let format = resolve_format(format, &file_config)?;

    let extractor = build_extractor(&file_config, min_reference_chars)?;
    let color = ColorMode(color_mode(&file_config, no_color) && output.is_none());

    let mut text = read_input(file_path)?;
    if strip_html {
        text = analysis::strip_tags(&text);
    }

    let report = if references_only {
        let references = extractor.extract_reference_list(&text);
        ExtractionReport {
            summary: summarize(&references),
            mentions: Vec::new(),
            references,
        }
    } else {
        extractor.extract(&text)
    };
    tracing::info!(
        mentions = report.mentions.len(),
        references = report.references.len(),
        "extraction finished"
    );

    let mut stdout = std::io::stdout();
    if let Some(path) = output {
        export_report(&report, format, &path)?;
        output::print_written(&mut stdout, &path, format, &report, color)?;
    } else if format == ExportFormat::Text {
        output::print_report(&mut stdout, &display_name(file_path), &report, color)?;
    } else {
        stdout.write_all(render(&report, format)?.as_bytes())?;
    }
    Ok(())
}

fn analyze(file_path: &Path, no_color: bool, config: Option<PathBuf>) -> anyhow::Result<()> {
    let file_config = load_config_file(config.as_deref())?;
    let extractor = build_extractor(&file_config, None)?;
    let color = ColorMode(color_mode(&file_config, no_color));
    let text = read_input(file_path)?;

    let stats = analysis::analyze(&text);
    let mentions = extractor.extract_mentions(&analysis::strip_tags(&text));
    let density = analysis::citation_density(&stats, &mentions);

    let mut stdout = std::io::stdout();
    output::print_stats(&mut stdout, &display_name(file_path), &stats, density, color)?;
    Ok(())
}
