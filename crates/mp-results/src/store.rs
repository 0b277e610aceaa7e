//! Output sink: CSV trajectory plus JSON manifest.

use std::fs;
use std::path::{Path, PathBuf};

use mp_sim::Trajectory;

use crate::ResultsResult;
use crate::csv::write_csv;
use crate::types::RunManifest;

/// Manifest location for a CSV output: `run.csv` -> `run.manifest.json`.
pub fn manifest_path_for(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("manifest.json")
}

#[derive(Debug, Clone)]
pub struct OutputSink {
    csv_path: PathBuf,
    manifest_path: Option<PathBuf>,
}

impl OutputSink {
    /// CSV only.
    pub fn new(csv_path: PathBuf) -> Self {
        Self {
            csv_path,
            manifest_path: None,
        }
    }

    /// CSV plus a manifest next to it.
    pub fn with_manifest(csv_path: PathBuf) -> Self {
        let manifest_path = manifest_path_for(&csv_path);
        Self {
            csv_path,
            manifest_path: Some(manifest_path),
        }
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    /// Write the trajectory, then the manifest if one is configured.
    pub fn save(&self, trajectory: &Trajectory, manifest: &RunManifest) -> ResultsResult<()> {
        write_csv(&self.csv_path, trajectory)?;
        if let Some(path) = &self.manifest_path {
            let manifest_json = serde_json::to_string_pretty(manifest)?;
            fs::write(path, manifest_json)?;
        }
        Ok(())
    }
}

pub fn load_manifest(path: &Path) -> ResultsResult<RunManifest> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
