use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::index::Visibility;

pub const PROJECT_CONFIG_FILE: &str = ".wikigraph.project.yml";

/// One import source: a file, a directory, or a glob of markdown files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub path: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectiveConfig {
    pub sources: Vec<SourceSpec>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: Option<Vec<RawSourceSpec>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawSourceSpec {
    path: String,
    #[serde(default)]
    visibility: Option<String>,
}

impl RawSourceSpec {
    fn into_source(self) -> Result<SourceSpec, ConfigError> {
        let visibility = match self.visibility.as_deref().map(str::trim) {
            None | Some("") => Visibility::Private,
            Some(raw) => Visibility::parse(raw)
                .ok_or_else(|| ConfigError::InvalidVisibility(raw.to_string()))?,
        };
        Ok(SourceSpec {
            path: self.path,
            visibility,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    InvalidVisibility(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Yaml(err) => write!(f, "{err}"),
            Self::InvalidVisibility(value) => {
                write!(f, "unknown visibility `{value}` (expected public or private)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

#[derive(Debug)]
struct ConfigLayer {
    sources: Vec<SourceSpec>,
    exclude: Option<Vec<String>>,
}

/// Merges user, nearest project, then repository config. Sources with the
/// same path are replaced in place by later layers; `exclude` is replaced
/// wholesale by the last layer that sets it.
pub fn load_effective_config(
    cwd: &Path,
    repo_config: Option<&Path>,
    user_config: Option<&Path>,
) -> Result<EffectiveConfig, ConfigError> {
    let mut merged = EffectiveConfig::default();

    if let Some(path) = user_config.filter(|path| path.exists()) {
        merge_layer(&mut merged, load_config_layer(path)?);
    }

    if let Some(path) = find_nearest_project_config(cwd) {
        merge_layer(&mut merged, load_config_layer(&path)?);
    }

    if let Some(path) = repo_config.filter(|path| path.exists()) {
        merge_layer(&mut merged, load_config_layer(path)?);
    }

    Ok(merged)
}

pub fn find_nearest_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

fn merge_layer(merged: &mut EffectiveConfig, layer: ConfigLayer) {
    merge_sources_dedup(&mut merged.sources, layer.sources);
    if let Some(exclude) = layer.exclude {
        merged.exclude = exclude;
    }
}

fn merge_sources_dedup(existing: &mut Vec<SourceSpec>, incoming: Vec<SourceSpec>) {
    let mut indices = existing
        .iter()
        .enumerate()
        .map(|(idx, source)| (source.path.clone(), idx))
        .collect::<HashMap<_, _>>();

    for source in incoming {
        if let Some(idx) = indices.get(&source.path).copied() {
            existing[idx] = source;
        } else {
            indices.insert(source.path.clone(), existing.len());
            existing.push(source);
        }
    }
}

fn load_config_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config_layer(&content)
}

fn parse_config_layer(content: &str) -> Result<ConfigLayer, ConfigError> {
    // An empty file deserializes to null, not to an empty mapping.
    if content.trim().is_empty() {
        return Ok(ConfigLayer {
            sources: Vec::new(),
            exclude: None,
        });
    }
    let raw: RawConfig = serde_yaml::from_str(content)?;
    let sources = raw
        .sources
        .unwrap_or_default()
        .into_iter()
        .map(RawSourceSpec::into_source)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConfigLayer {
        sources,
        exclude: raw.exclude,
    })
}

pub fn load_config_file(path: &Path) -> Result<EffectiveConfig, ConfigError> {
    let layer = load_config_layer(path)?;
    Ok(EffectiveConfig {
        sources: layer.sources,
        exclude: layer.exclude.unwrap_or_default(),
    })
}

pub fn default_repo_config_yaml() -> String {
    r#"sources:
  - path: notes/**/*.md
    visibility: private
exclude:
  - "**/drafts/*"
"#
    .to_string()
}

pub fn default_global_config_yaml() -> String {
    r#"sources:
  - path: ~/notes/**/*.md
    visibility: private
exclude: []
"#
    .to_string()
}

pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(path)
}
