//! Loaded-model registry
//!
//! Built once at startup from the manifest. Every (pollutant, site) entry is
//! loaded independently: one bad artifact never prevents the others from
//! loading, and no load failure is fatal to the process.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::manifest::{ManifestEntry, ModelManifest};
use super::model::{ArtifactLoader, ForecastModel};
use crate::models::Pollutant;

/// Load state of one manifest entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAvailability {
    pub pollutant: Pollutant,
    pub site: String,
    pub enabled: bool,
    pub loaded: bool,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only introspection of the registry
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub models_enabled: bool,
    pub models_loaded: bool,
    pub no2_models_count: usize,
    pub o3_models_count: usize,
    pub available: bool,
    pub message: String,
    pub default_site: String,
    pub entries: Vec<ModelAvailability>,
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    models_enabled: bool,
    default_site: String,
    entries: Vec<ModelAvailability>,
    handles: HashMap<(Pollutant, String), Arc<dyn ForecastModel>>,
}

impl ModelRegistry {
    /// Registry with the model feature switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            models_enabled: false,
            default_site: "site1".to_string(),
            ..Self::default()
        }
    }

    /// Registry built from already-loaded handles
    #[must_use]
    pub fn with_handles(
        default_site: &str,
        handles: impl IntoIterator<Item = (String, Arc<dyn ForecastModel>)>,
    ) -> Self {
        let mut registry = Self {
            models_enabled: true,
            default_site: default_site.to_string(),
            ..Self::default()
        };
        for (site, model) in handles {
            registry.entries.push(ModelAvailability {
                pollutant: model.pollutant(),
                site: site.clone(),
                enabled: true,
                loaded: true,
                path: String::new(),
                error: None,
            });
            registry.handles.insert((model.pollutant(), site), model);
        }
        registry
    }

    /// Load every manifest entry through `loader`
    pub fn load(manifest: &ModelManifest, loader: &dyn ArtifactLoader) -> Self {
        let mut registry = Self {
            models_enabled: manifest.models_enabled,
            default_site: manifest.default_site.clone(),
            ..Self::default()
        };

        if !manifest.models_enabled {
            info!("ML models are disabled in configuration");
            registry.record_disabled(Pollutant::No2, &manifest.no2_models);
            registry.record_disabled(Pollutant::O3, &manifest.o3_models);
            return registry;
        }

        let models_dir = manifest.models_dir();
        if !models_dir.exists() {
            warn!("Models directory does not exist: {}", models_dir.display());
        }

        for (site, entry) in &manifest.no2_models {
            registry.load_entry(manifest, loader, Pollutant::No2, site, entry, None);
        }

        for (site, entry) in &manifest.o3_models {
            let scaler = manifest.o3_scalers.get(site);
            registry.load_entry(manifest, loader, Pollutant::O3, site, entry, Some(scaler));
        }

        if registry.any_loaded() {
            info!(
                "Loaded {} NO2 models and {} O3 models",
                registry.count(Pollutant::No2),
                registry.count(Pollutant::O3)
            );
        } else {
            warn!("No models were loaded successfully");
        }

        registry
    }

    fn record_disabled(
        &mut self,
        pollutant: Pollutant,
        entries: &std::collections::BTreeMap<String, ManifestEntry>,
    ) {
        for (site, entry) in entries {
            self.entries.push(ModelAvailability {
                pollutant,
                site: site.clone(),
                enabled: false,
                loaded: false,
                path: entry.path().to_string(),
                error: None,
            });
        }
    }

    /// `scaler` is `None` when the pollutant takes no scaler and
    /// `Some(None)` when one is required but not configured.
    fn load_entry(
        &mut self,
        manifest: &ModelManifest,
        loader: &dyn ArtifactLoader,
        pollutant: Pollutant,
        site: &str,
        entry: &ManifestEntry,
        scaler: Option<Option<&ManifestEntry>>,
    ) {
        let mut availability = ModelAvailability {
            pollutant,
            site: site.to_string(),
            enabled: entry.enabled(),
            loaded: false,
            path: entry.path().to_string(),
            error: None,
        };

        if !entry.enabled() {
            info!("{pollutant} model for {site} is disabled in the manifest");
            self.entries.push(availability);
            return;
        }

        let scaler_path = match scaler {
            Some(Some(scaler)) if scaler.enabled() => Some(manifest.resolve(scaler)),
            Some(_) => {
                warn!("{pollutant} model for {site} has no usable scaler. Skipping this site.");
                availability.error = Some("scaler not configured".to_string());
                self.entries.push(availability);
                return;
            }
            None => None,
        };

        let artifact = manifest.resolve(entry);
        match loader.load(pollutant, &artifact, scaler_path.as_deref()) {
            Ok(model) => {
                info!("Loaded {pollutant} model for {site}: {}", artifact.display());
                availability.loaded = true;
                self.handles.insert((pollutant, site.to_string()), model);
            }
            Err(e) => {
                warn!("{pollutant} model for {site} failed to load: {e}");
                availability.error = Some(e.to_string());
            }
        }
        self.entries.push(availability);
    }

    #[must_use]
    pub fn models_enabled(&self) -> bool {
        self.models_enabled
    }

    #[must_use]
    pub fn default_site(&self) -> &str {
        &self.default_site
    }

    #[must_use]
    pub fn get(&self, pollutant: Pollutant, site: &str) -> Option<Arc<dyn ForecastModel>> {
        self.handles.get(&(pollutant, site.to_string())).cloned()
    }

    #[must_use]
    pub fn count(&self, pollutant: Pollutant) -> usize {
        self.handles.keys().filter(|(p, _)| *p == pollutant).count()
    }

    #[must_use]
    pub fn any_loaded(&self) -> bool {
        !self.handles.is_empty()
    }

    /// At least one model loaded for every pollutant
    #[must_use]
    pub fn fully_available(&self) -> bool {
        self.models_enabled && Pollutant::all().iter().all(|p| self.count(*p) > 0)
    }

    #[must_use]
    pub fn entries(&self) -> &[ModelAvailability] {
        &self.entries
    }

    #[must_use]
    pub fn status(&self) -> ModelStatus {
        let models_loaded = self.models_enabled && self.any_loaded();
        let message = if !self.models_enabled {
            "ML models are disabled in configuration"
        } else if models_loaded {
            "ML models are operational"
        } else {
            "ML models are not available"
        };

        ModelStatus {
            models_enabled: self.models_enabled,
            models_loaded,
            no2_models_count: self.count(Pollutant::No2),
            o3_models_count: self.count(Pollutant::O3),
            available: self.fully_available(),
            message: message.to_string(),
            default_site: self.default_site.clone(),
            entries: self.entries.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::FileArtifactLoader;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn manifest_in(dir: &Path, enabled: bool) -> ModelManifest {
        let mut no2_models = BTreeMap::new();
        no2_models.insert("site1".to_string(), ManifestEntry::Path("no2_site1.pkl".into()));
        no2_models.insert("site2".to_string(), ManifestEntry::Path("no2_site2.pkl".into()));
        let mut o3_models = BTreeMap::new();
        o3_models.insert("site1".to_string(), ManifestEntry::Path("o3_site1.keras".into()));
        o3_models.insert("site2".to_string(), ManifestEntry::Path("o3_site2.keras".into()));
        let mut o3_scalers = BTreeMap::new();
        o3_scalers.insert("site1".to_string(), ManifestEntry::Path("o3_scaler_site1.pkl".into()));

        ModelManifest {
            models_enabled: enabled,
            models_directory: "models".to_string(),
            default_site: "site1".to_string(),
            no2_models,
            o3_models,
            o3_scalers,
            base_dir: dir.to_path_buf(),
        }
    }

    fn write_artifacts(dir: &Path, names: &[&str]) {
        let models = dir.join("models");
        std::fs::create_dir_all(&models).unwrap();
        for name in names {
            std::fs::write(models.join(name), b"artifact").unwrap();
        }
    }

    #[test]
    fn missing_artifact_only_affects_its_entry() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(
            dir.path(),
            &["no2_site1.pkl", "o3_site1.keras", "o3_scaler_site1.pkl"],
        );

        let registry = ModelRegistry::load(&manifest_in(dir.path(), true), &FileArtifactLoader);
        let status = registry.status();

        assert!(status.models_enabled);
        assert!(status.models_loaded);
        assert_eq!(status.no2_models_count, 1);
        assert_eq!(status.o3_models_count, 1);
        assert!(status.available);

        let no2_site2 = status
            .entries
            .iter()
            .find(|e| e.pollutant == Pollutant::No2 && e.site == "site2")
            .unwrap();
        assert!(!no2_site2.loaded);
        assert!(no2_site2.error.is_some());

        assert!(registry.get(Pollutant::No2, "site1").is_some());
        assert!(registry.get(Pollutant::No2, "site2").is_none());
    }

    #[test]
    fn o3_model_without_scaler_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &["o3_site2.keras"]);

        let registry = ModelRegistry::load(&manifest_in(dir.path(), true), &FileArtifactLoader);
        assert!(registry.get(Pollutant::O3, "site2").is_none());
        let entry = registry
            .entries()
            .iter()
            .find(|e| e.pollutant == Pollutant::O3 && e.site == "site2")
            .unwrap();
        assert_eq!(entry.error.as_deref(), Some("scaler not configured"));
    }

    #[test]
    fn disabled_manifest_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &["no2_site1.pkl"]);

        let registry = ModelRegistry::load(&manifest_in(dir.path(), false), &FileArtifactLoader);
        let status = registry.status();
        assert!(!status.models_enabled);
        assert!(!status.models_loaded);
        assert!(!status.available);
        assert_eq!(status.entries.len(), 4);
        assert!(status.entries.iter().all(|e| !e.enabled && !e.loaded));
        assert!(status.message.contains("disabled"));
    }

    #[test]
    fn disabled_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &["no2_site1.pkl"]);
        let mut manifest = manifest_in(dir.path(), true);
        manifest.no2_models.insert(
            "site1".to_string(),
            ManifestEntry::Detailed {
                path: "no2_site1.pkl".to_string(),
                enabled: false,
            },
        );

        let registry = ModelRegistry::load(&manifest, &FileArtifactLoader);
        assert!(registry.get(Pollutant::No2, "site1").is_none());
        assert!(!registry.any_loaded());
        assert_eq!(registry.status().message, "ML models are not available");
    }
}
