use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

///
/// File name with every extension stripped: `s1_L001.sorted.bam` -> `s1_L001`.
///
pub fn remove_all_extensions(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    match name.split_once('.') {
        // hidden files keep their leading dot
        Some(("", _)) => name,
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

///
/// Derive a sample identifier from an input file name: the first token before
/// `separator`, after extensions are removed.
///
/// `ctrl1_S1_R1.bam` with separator `_` gives `ctrl1`.
///
pub fn derive_sample_id(path: &Path, separator: &str) -> String {
    let stem = remove_all_extensions(path);
    if separator.is_empty() {
        return stem;
    }
    match stem.split(separator).next() {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => stem,
    }
}

///
/// List the files in `dir` whose name ends with one of `extensions`
/// (case-insensitive), sorted by file name so discovery order is stable
/// across runs.
///
pub fn discover_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("There was an error reading the input directory: {:?}", dir))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext.to_lowercase())))
        {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
