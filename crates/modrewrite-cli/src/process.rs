//! Descriptor file processing for modrewrite

use anyhow::{Context, Result};
use modrewrite_core::{ModuleDescriptor, ModuleId, RewriteTarget};
use modrewrite_rules::{Change, Rewriter};
use std::path::{Path, PathBuf};

/// File name looked for when a directory is given
pub const DESCRIPTOR_FILE_NAME: &str = "module.json";

/// Result of rewriting a single descriptor file
#[derive(Debug)]
pub struct ProcessResult {
    /// Identity of the rewritten descriptor
    pub module: ModuleId,
    /// Changes made by the rules
    pub changes: Vec<Change>,
    /// Original descriptor, normalized to pretty JSON
    pub old_source: String,
    /// Rewritten descriptor (only if something changed)
    pub new_source: Option<String>,
}

/// Rewrite a single descriptor file without writing it back
pub fn process_file(path: &Path, rewriter: &Rewriter) -> Result<ProcessResult> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut descriptor: ModuleDescriptor = serde_json::from_str(&source)
        .with_context(|| format!("Invalid module descriptor: {}", path.display()))?;

    let module = descriptor.identity();
    let old_source = render(&descriptor)?;
    let changes = rewriter.rewrite_in_place(&mut descriptor);

    let new_source = if changes.is_empty() {
        None
    } else {
        Some(render(&descriptor)?)
    };

    Ok(ProcessResult {
        module,
        changes,
        old_source,
        new_source,
    })
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Expand the command line paths into descriptor files
///
/// Directories are searched recursively for `module.json`. Returns the files
/// found and the paths that do not exist.
pub fn collect_descriptor_paths(paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut missing = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(
                walkdir::WalkDir::new(path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && e.file_name() == std::ffi::OsStr::new(DESCRIPTOR_FILE_NAME))
                    .map(|e| e.into_path()),
            );
        } else {
            missing.push(path.clone());
        }
    }

    files.sort();
    files.dedup();
    (files, missing)
}

fn render(descriptor: &ModuleDescriptor) -> Result<String> {
    let mut text = serde_json::to_string_pretty(descriptor).context("Failed to serialize descriptor")?;
    text.push('\n');
    Ok(text)
}
