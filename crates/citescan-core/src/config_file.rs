use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingSection {
    /// Reference-list lines of this many characters or fewer are dropped.
    pub min_reference_chars: Option<usize>,
    pub max_authors: Option<usize>,
    /// Replaces the built-in heading list (References, Bibliography, Works Cited).
    pub reference_headings: Option<Vec<String>>,
    /// Capitalized words that must never be read as an author name.
    pub extra_name_stopwords: Option<Vec<String>>,
    pub budget_base_ms: Option<u64>,
    pub budget_ms_per_kib: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub format: Option<String>,
    pub color: Option<bool>,
}

/// Platform config directory path: `<config_dir>/citescan/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("citescan").join("config.toml"))
}

/// Load config by cascading CWD `.citescan.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".citescan.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    try_load_from_path(path).ok()
}

/// Like [`load_from_path`] but reports why loading failed.
pub fn try_load_from_path(path: &Path) -> Result<ConfigFile, CoreError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bp = base.parsing.unwrap_or_default();
    let op = overlay.parsing.unwrap_or_default();
    let bo = base.output.unwrap_or_default();
    let oo = overlay.output.unwrap_or_default();

    ConfigFile {
        parsing: Some(ParsingSection {
            min_reference_chars: op.min_reference_chars.or(bp.min_reference_chars),
            max_authors: op.max_authors.or(bp.max_authors),
            reference_headings: op.reference_headings.or(bp.reference_headings),
            extra_name_stopwords: op.extra_name_stopwords.or(bp.extra_name_stopwords),
            budget_base_ms: op.budget_base_ms.or(bp.budget_base_ms),
            budget_ms_per_kib: op.budget_ms_per_kib.or(bp.budget_ms_per_kib),
        }),
        output: Some(OutputSection {
            format: oo.format.or(bo.format),
            color: oo.color.or(bo.color),
        }),
    }
}

/// Save the config to an explicit path, creating parent directories.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
