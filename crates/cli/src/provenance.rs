use anyhow::{Context, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Sidecar written next to every diagram file.
#[derive(Debug, Serialize)]
pub struct Provenance<'a> {
    pub code_rev: String,
    pub version: &'static str,
    pub instructions: &'a Path,
    /// Seed of the attempt that produced the diagram.
    pub seed: u64,
    pub outputs: Vec<String>,
}

impl<'a> Provenance<'a> {
    pub fn new(instructions: &'a Path, seed: u64) -> Self {
        Self {
            code_rev: current_git_rev(),
            version: diagram::VERSION,
            instructions,
            seed,
            outputs: Vec::new(),
        }
    }
}

/// Write `<artifact stem>.provenance.json` and return its path.
pub fn write_sidecar(artifact: &Path, mut prov: Provenance<'_>) -> Result<PathBuf> {
    let path = provenance_path(artifact);
    prov.outputs.push(artifact.to_string_lossy().into_owned());
    fs::write(&path, serde_json::to_vec_pretty(&prov)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("diagram"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// `GIT_COMMIT` from the build or the runtime environment.
pub fn current_git_rev() -> String {
    option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|rev| !rev.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}
