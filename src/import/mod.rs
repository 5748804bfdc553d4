use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use glob::glob;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{EffectiveConfig, SourceSpec, expand_tilde};
use crate::index::{SqliteStore, StoreError, Visibility};
use crate::store::{ImportFileState, ImportState};

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

#[derive(Debug)]
pub enum ImportError {
    Glob(String),
    State(io::Error),
    Store(StoreError),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Glob(_) => "glob_error",
            Self::State(_) => "import_state_error",
            Self::Store(err) => err.code(),
        }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glob(message) => write!(f, "{message}"),
            Self::State(err) => write!(f, "import state: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    pub path: PathBuf,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub scanned: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped_unchanged: usize,
    pub failures: Vec<ImportFailure>,
}

/// Reads every configured markdown file into the store.
///
/// Files whose content hash matches the previous run are skipped. A file
/// that cannot be read or stored is reported and the run continues; the
/// state file only records files that made it into the store.
pub fn run_import(
    store: &SqliteStore,
    cwd: &Path,
    home: &Path,
    config: &EffectiveConfig,
    state_path: &Path,
) -> Result<ImportSummary, ImportError> {
    let candidates = resolve_source_files(cwd, home, &config.sources, &config.exclude)?;
    let mut state = ImportState::load(state_path).map_err(ImportError::State)?;
    let mut summary = ImportSummary::default();

    for candidate in candidates {
        summary.scanned += 1;
        let source_key = candidate.path.to_string_lossy().into_owned();
        let body = match fs::read_to_string(&candidate.path) {
            Ok(body) => body,
            Err(err) => {
                warn!(path = %source_key, error = %err, "skipping unreadable source");
                summary.failures.push(ImportFailure {
                    path: source_key,
                    error: err.to_string(),
                });
                continue;
            }
        };

        let input_hash = sha256_hex(&body);
        if state.is_unchanged(&source_key, &input_hash) {
            summary.skipped_unchanged += 1;
            continue;
        }

        let document_path = document_identifier(cwd, &candidate.path);
        let title = document_title(&body, &candidate.path);
        match store.upsert_imported(&document_path, &title, &body, candidate.visibility) {
            Ok((_, true)) => summary.created += 1,
            Ok((_, false)) => summary.updated += 1,
            Err(StoreError::Sqlite(err)) => return Err(StoreError::Sqlite(err).into()),
            Err(err) => {
                summary.failures.push(ImportFailure {
                    path: source_key,
                    error: err.to_string(),
                });
                continue;
            }
        }

        state.files.insert(
            source_key,
            ImportFileState {
                input_hash,
                document_path,
            },
        );
    }

    state.save(state_path).map_err(ImportError::State)?;
    info!(
        scanned = summary.scanned,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped_unchanged,
        failures = summary.failures.len(),
        "import finished"
    );
    Ok(summary)
}

/// Expands every source into concrete files. Globs match whatever the
/// pattern names; directories contribute their markdown files.
pub fn resolve_source_files(
    cwd: &Path,
    home: &Path,
    sources: &[SourceSpec],
    exclude_patterns: &[String],
) -> Result<Vec<ImportCandidate>, ImportError> {
    let excludes = compile_excludes(cwd, home, exclude_patterns)?;
    let mut out = Vec::new();

    for source in sources {
        let raw_path = source.path.trim();
        if raw_path.is_empty() {
            continue;
        }
        let expanded = absolutize(cwd, expand_tilde(raw_path, home));
        let source_files = if looks_like_glob(raw_path) {
            glob_paths(&expanded)?
        } else if expanded.is_dir() {
            WalkDir::new(&expanded)
                .into_iter()
                .filter_map(Result::ok)
                .map(|entry| entry.into_path())
                .filter(|path| path.is_file() && is_markdown(path))
                .collect::<Vec<_>>()
        } else if expanded.is_file() {
            vec![expanded]
        } else {
            Vec::new()
        };

        out.extend(
            source_files
                .into_iter()
                .filter(|path| !is_excluded(path, &excludes))
                .map(|path| ImportCandidate {
                    path,
                    visibility: source.visibility,
                }),
        );
    }

    // First source naming a file decides its visibility.
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out.dedup_by(|later, earlier| later.path == earlier.path);
    Ok(out)
}

/// Source path relative to `cwd`, extension stripped, `/`-separated.
pub fn document_identifier(cwd: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(cwd).unwrap_or(file);
    let without_ext = relative.with_extension("");
    without_ext
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// First level-one heading, else the file stem.
pub fn document_title(body: &str, file: &Path) -> String {
    body.lines()
        .filter_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .find(|heading| !heading.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| {
            file.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn looks_like_glob(path: &str) -> bool {
    ['*', '?', '[', ']', '{', '}']
        .iter()
        .any(|ch| path.contains(*ch))
}

fn glob_paths(pattern: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let pattern_str = pattern.to_string_lossy();
    let entries = glob(&pattern_str)
        .map_err(|err| ImportError::Glob(format!("{} ({pattern_str})", err.msg)))?;
    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => out.push(path),
            Ok(_) => {}
            Err(err) => return Err(ImportError::Glob(err.to_string())),
        }
    }
    Ok(out)
}

fn compile_excludes(
    cwd: &Path,
    home: &Path,
    patterns: &[String],
) -> Result<Vec<glob::Pattern>, ImportError> {
    let mut compiled = Vec::new();
    for pattern in patterns {
        let raw = pattern.trim();
        if raw.is_empty() {
            continue;
        }
        let normalized = absolutize(cwd, expand_tilde(raw, home));
        let compiled_pattern = glob::Pattern::new(&normalized.to_string_lossy())
            .map_err(|err| ImportError::Glob(format!("exclude `{raw}`: {err}")))?;
        compiled.push(compiled_pattern);
    }
    Ok(compiled)
}

fn is_excluded(path: &Path, excludes: &[glob::Pattern]) -> bool {
    excludes.iter().any(|pattern| pattern.matches_path(path))
}
