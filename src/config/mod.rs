//! Configuration loader (spec.md §6, SPEC_FULL.md §10).
//!
//! A single [`EngineConfig`] deserialized from YAML, found at `CONFIG_PATH`
//! or one of a handful of well-known relative paths, falling back to
//! built-in defaults when none exists. `${models.<key>}` placeholders
//! anywhere in the document are expanded from the `models` section before
//! the rest of the document is deserialized; environment variables of the
//! form `<PREFIX>_A_B_C=value` then override the nested key they resolve
//! to, with the value parsed as a YAML scalar.

use crate::chunking::ChunkerConfig;
use crate::error::ConfigError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default prefix for environment-variable overrides.
pub const DEFAULT_ENV_PREFIX: &str = "RLM";

/// Well-known relative paths searched, in order, when `CONFIG_PATH` is
/// unset.
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "./config.yaml",
    "./config/application.yaml",
    "/etc/retrieval/config.yaml",
];

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Named model identifiers, referenced elsewhere in this document via
    /// `${models.<key>}` placeholders.
    pub models: HashMap<String, String>,
    /// Document ingestion pipeline settings.
    pub document: DocumentPipelineConfig,
    /// Repository ingestion pipeline settings.
    pub repository: RepositoryPipelineConfig,
    /// Multi-stage retriever settings.
    pub retriever: RetrieverSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models: HashMap::new(),
            document: DocumentPipelineConfig::default(),
            repository: RepositoryPipelineConfig::default(),
            retriever: RetrieverSettings::default(),
        }
    }
}

/// Document pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DocumentPipelineConfig {
    /// Chunker window/overlap configuration.
    pub chunk: ChunkerConfig,
}

impl Default for DocumentPipelineConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkerConfig::DOCUMENT_DEFAULT,
        }
    }
}

/// Repository pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RepositoryPipelineConfig {
    /// Chunker window/overlap configuration.
    pub chunk: ChunkerConfig,
    /// Overview-builder thresholds.
    pub overview: OverviewSettings,
}

impl Default for RepositoryPipelineConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkerConfig::REPOSITORY_DEFAULT,
            overview: OverviewSettings::default(),
        }
    }
}

/// Overview-builder thresholds (spec.md §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OverviewSettings {
    /// Maximum README length, in characters, kept verbatim.
    pub readme_max_chars: usize,
    /// Number of largest files considered when no README is present.
    pub generated_overview_file_count: usize,
    /// Per-file character limit applied in the no-README path.
    pub per_file_limit: usize,
    /// Number of truncated files concatenated when summarization itself
    /// fails in the no-README path.
    pub concat_fallback_file_count: usize,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self {
            readme_max_chars: crate::overview::README_MAX_CHARS,
            generated_overview_file_count: crate::overview::GENERATED_OVERVIEW_FILE_COUNT,
            per_file_limit: crate::overview::PER_FILE_LIMIT,
            concat_fallback_file_count: crate::overview::CONCAT_FALLBACK_FILE_COUNT,
        }
    }
}

/// Multi-stage retriever settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RetrieverSettings {
    /// Maximum number of candidates kept after cross-rerank.
    pub rerank_top_k: usize,
    /// Default `topK` used when a [`crate::core::QueryRequest`] omits it.
    pub top_k_default: usize,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            rerank_top_k: 10,
            top_k_default: crate::core::DEFAULT_TOP_K,
        }
    }
}

/// Loads the engine configuration using [`DEFAULT_ENV_PREFIX`] for
/// environment overrides.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFailed`] if `CONFIG_PATH` is set but
/// unreadable, or [`ConfigError::Parse`]/[`ConfigError::UnresolvedPlaceholder`]/
/// [`ConfigError::InvalidOverride`] if the document is malformed.
pub fn load() -> Result<EngineConfig> {
    load_with_prefix(DEFAULT_ENV_PREFIX)
}

/// Loads the engine configuration, using `env_prefix` for environment
/// overrides (`<PREFIX>_A_B_C=value`).
///
/// # Errors
///
/// See [`load`].
pub fn load_with_prefix(env_prefix: &str) -> Result<EngineConfig> {
    // Start from the default-populated shape rather than an empty mapping,
    // so `resolve_override_path` has every field to match against even when
    // no config file exists or a file only sets some sections.
    let mut value = serde_yaml::to_value(EngineConfig::default()).map_err(ConfigError::from)?;

    if let Some(text) = read_source()? {
        let loaded =
            serde_yaml::from_str::<serde_yaml::Value>(&text).map_err(ConfigError::from)?;
        merge_mapping(&mut value, loaded);
    }

    let models = extract_models(&value);
    expand_placeholders(&mut value, &models)?;
    apply_env_overrides(&mut value, env_prefix)?;

    serde_yaml::from_value(value)
        .map_err(|e| ConfigError::Parse(e.to_string()).into())
}

/// Deep-merges `overlay` onto `base`, recursing into nested mappings and
/// letting `overlay`'s scalars/sequences replace `base`'s leaves, so a
/// partial config file only overrides the sections it actually sets while
/// every other default-populated key survives untouched.
fn merge_mapping(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => merge_mapping(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn read_source() -> Result<Option<String>> {
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        return std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| {
                ConfigError::ReadFailed {
                    path,
                    reason: e.to_string(),
                }
                .into()
            });
    }

    for candidate in WELL_KNOWN_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            return std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| {
                    ConfigError::ReadFailed {
                        path: candidate.to_string(),
                        reason: e.to_string(),
                    }
                    .into()
                });
        }
    }

    Ok(None)
}

fn extract_models(value: &serde_yaml::Value) -> HashMap<String, String> {
    value
        .get("models")
        .and_then(serde_yaml::Value::as_mapping)
        .map(|mapping| {
            mapping
                .iter()
                .filter_map(|(k, v)| {
                    let key = k.as_str()?.to_string();
                    let val = v.as_str()?.to_string();
                    Some((key, val))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn expand_placeholders(value: &mut serde_yaml::Value, models: &HashMap<String, String>) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => {
            *s = resolve_placeholders(s, models)?;
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_placeholders(v, models)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                expand_placeholders(v, models)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn resolve_placeholders(text: &str, models: &HashMap<String, String>) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${models.") {
        result.push_str(&rest[..start]);
        let after = &rest[start + "${models.".len()..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let key = &after[..end];
        let Some(resolved) = models.get(key) else {
            return Err(ConfigError::UnresolvedPlaceholder {
                placeholder: format!("${{models.{key}}}"),
            }
            .into());
        };
        result.push_str(resolved);
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

fn apply_env_overrides(value: &mut serde_yaml::Value, prefix: &str) -> Result<()> {
    let marker = format!("{prefix}_");
    for (key, raw) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(&marker) else {
            continue;
        };
        if suffix.is_empty() {
            continue;
        }
        let tokens: Vec<String> = suffix.split('_').map(str::to_lowercase).collect();
        let Some(path) = resolve_override_path(value, &tokens) else {
            continue;
        };
        let parsed: serde_yaml::Value = serde_yaml::from_str(&raw).map_err(|e| ConfigError::InvalidOverride {
            key: path.join("."),
            reason: e.to_string(),
        })?;
        set_nested(value, &path, parsed);
    }
    Ok(())
}

/// Greedily matches the longest run of `tokens` (joined with `_`) against
/// the current mapping level's keys, descends, and repeats, so an
/// underscored env-var suffix like `RETRIEVER_TOP_K_DEFAULT` resolves
/// against nested field names that themselves contain underscores
/// (`retriever.top_k_default`) rather than assuming one token per level.
fn resolve_override_path(root: &serde_yaml::Value, tokens: &[String]) -> Option<Vec<String>> {
    let mut path = Vec::new();
    let mut current = root;
    let mut remaining = tokens;

    while !remaining.is_empty() {
        let mapping = current.as_mapping()?;
        let (consumed, key) = (1..=remaining.len())
            .rev()
            .find_map(|n| {
                let candidate = remaining[..n].join("_");
                mapping
                    .iter()
                    .find(|(k, _)| k.as_str().is_some_and(|s| s.eq_ignore_ascii_case(&candidate)))
                    .map(|(k, _)| (n, k.as_str().unwrap_or(&candidate).to_string()))
            })?;
        path.push(key);
        current = mapping.get(remaining[..consumed].join("_").as_str()).or_else(|| {
            mapping
                .iter()
                .find(|(k, _)| k.as_str().is_some_and(|s| s.eq_ignore_ascii_case(&remaining[..consumed].join("_"))))
                .map(|(_, v)| v)
        })?;
        remaining = &remaining[consumed..];
    }

    Some(path)
}

fn set_nested(root: &mut serde_yaml::Value, path: &[String], new_value: serde_yaml::Value) {
    let mut current = root;
    for key in &path[..path.len().saturating_sub(1)] {
        let serde_yaml::Value::Mapping(map) = current else {
            return;
        };
        let entry = map
            .entry(serde_yaml::Value::String(key.clone()))
            .or_insert_with(|| serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
        current = entry;
    }
    if let (Some(last), serde_yaml::Value::Mapping(map)) = (path.last(), current) {
        map.insert(serde_yaml::Value::String(last.clone()), new_value);
    }
}

/// Builds a default [`PathBuf`] suggestion for `CONFIG_PATH` (used only by
/// the dev CLI's `--help` text, never read by [`load`] itself).
#[must_use]
pub fn default_config_path_hint() -> PathBuf {
    PathBuf::from(WELL_KNOWN_PATHS[0])
}
