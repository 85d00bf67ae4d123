//! Batch FBX -> scrap definition extraction

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::classify::compute_definition;
use super::definition::ScrapDefinition;
use super::fbx::{self, FbxError};
use super::scene::SceneSummary;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Fbx {
        path: PathBuf,
        #[source]
        source: FbxError,
    },

    #[error("failed to serialize definitions: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExtractError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ExtractError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Asset paths in the output are relative to this directory
    pub root: PathBuf,
    /// Directory scanned recursively for `.fbx` files
    pub assets_dir: PathBuf,
    /// JSON file to write
    pub output: PathBuf,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub written: usize,
    pub failed: Vec<PathBuf>,
    /// `None` when nothing was written
    pub output: Option<PathBuf>,
}

/// All `.fbx` files under `dir` (any case), in sorted directory order
pub fn list_fbx_files(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| ExtractError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExtractError::io(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ExtractError::io(&path, e))?;
        if file_type.is_dir() {
            files.extend(list_fbx_files(&path)?);
        } else if file_type.is_file() && has_fbx_extension(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn has_fbx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("fbx"))
}

/// `path` relative to `root` with forward slashes
pub fn relative_asset_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse and classify a single file
pub fn process_file(root: &Path, path: &Path) -> Result<ScrapDefinition, ExtractError> {
    let bytes = fs::read(path).map_err(|e| ExtractError::io(path, e))?;
    let document = fbx::parse(&bytes).map_err(|source| ExtractError::Fbx {
        path: path.to_path_buf(),
        source,
    })?;
    let summary = SceneSummary::from_document(&document);
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(compute_definition(&id, &relative_asset_path(root, path), &summary))
}

/// Case-insensitive id order, ties broken by exact bytes
pub fn sort_definitions(definitions: &mut [ScrapDefinition]) {
    definitions.sort_by(|a, b| {
        a.id.to_lowercase()
            .cmp(&b.id.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Process every model under `assets_dir` and write the definition list
pub fn extract_all(options: &ExtractOptions) -> Result<ExtractReport, ExtractError> {
    let files = list_fbx_files(&options.assets_dir)?;
    if files.is_empty() {
        log::warn!("No FBX files found in {}", options.assets_dir.display());
        return Ok(ExtractReport::default());
    }

    let mut report = ExtractReport::default();
    let mut definitions = Vec::with_capacity(files.len());
    for file in files {
        match process_file(&options.root, &file) {
            Ok(def) => {
                log::info!("Processed {}", def.id);
                definitions.push(def);
            }
            Err(e) => {
                log::error!("Failed to process {}", e);
                report.failed.push(file);
            }
        }
    }

    sort_definitions(&mut definitions);
    if let Some(parent) = options.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(&definitions)?;
    fs::write(&options.output, json).map_err(|e| ExtractError::io(&options.output, e))?;

    log::info!(
        "Wrote {} scrap definitions to {}",
        definitions.len(),
        options.output.display()
    );
    report.written = definitions.len();
    report.output = Some(options.output.clone());
    Ok(report)
}
