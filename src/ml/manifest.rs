//! Model manifest
//!
//! The manifest lists, per site and pollutant, the artifact to load and
//! whether the entry is enabled. It is read once at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AirWatchError;

/// One artifact entry: either a bare relative path or a path with a flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
}

fn default_enabled() -> bool {
    true
}

impl ManifestEntry {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            ManifestEntry::Path(path) | ManifestEntry::Detailed { path, .. } => path,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        match self {
            ManifestEntry::Path(_) => true,
            ManifestEntry::Detailed { enabled, .. } => *enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    #[serde(default)]
    pub models_enabled: bool,
    /// Artifact directory, relative to the manifest file
    #[serde(default = "default_models_directory")]
    pub models_directory: String,
    #[serde(default = "default_site")]
    pub default_site: String,
    #[serde(default)]
    pub no2_models: BTreeMap<String, ManifestEntry>,
    #[serde(default)]
    pub o3_models: BTreeMap<String, ManifestEntry>,
    /// Feature scalers paired with the O3 models by site
    #[serde(default)]
    pub o3_scalers: BTreeMap<String, ManifestEntry>,
    /// Directory the manifest was read from
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_models_directory() -> String {
    "models".to_string()
}

fn default_site() -> String {
    "site1".to_string()
}

impl Default for ModelManifest {
    fn default() -> Self {
        Self {
            models_enabled: false,
            models_directory: default_models_directory(),
            default_site: default_site(),
            no2_models: BTreeMap::new(),
            o3_models: BTreeMap::new(),
            o3_scalers: BTreeMap::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl ModelManifest {
    /// Read the manifest, treating a missing file as "models disabled".
    ///
    /// A manifest that exists but cannot be parsed is reported as an error so
    /// the caller can log it; the service still starts without models.
    pub fn load(path: &Path) -> Result<Self, AirWatchError> {
        if !path.exists() {
            warn!("Model manifest not found: {}", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut manifest: ModelManifest = serde_json::from_str(&raw).map_err(|e| {
            AirWatchError::model(format!(
                "Failed to parse model manifest {}: {e}",
                path.display()
            ))
        })?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        info!("Loaded model manifest from {}", path.display());
        Ok(manifest)
    }

    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.base_dir.join(&self.models_directory)
    }

    #[must_use]
    pub fn resolve(&self, entry: &ManifestEntry) -> PathBuf {
        self.models_dir().join(entry.path())
    }
}
