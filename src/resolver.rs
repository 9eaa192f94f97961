//! Availability resolution for model-gated endpoints
//!
//! Decides per request whether forecast and hotspot data is served by a
//! loaded model, by the live/mock fallback chain, or not at all.

use std::sync::Arc;

use crate::error::Unavailability;
use crate::ml::{ForecastModel, ModelRegistry};
use crate::models::Pollutant;

/// Outcome for a forecast request
#[derive(Debug, Clone)]
pub enum ForecastResolution {
    /// Serve from this model
    Model {
        site: String,
        model: Arc<dyn ForecastModel>,
    },
    /// Models are switched off: live API first, then mock data
    LiveFallback,
    Unavailable(Unavailability),
}

/// Outcome for a hotspot request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotspotResolution {
    /// Model set is complete; station data is served as usual
    ModelBacked,
    LiveFallback,
    Unavailable(Unavailability),
}

/// Resolve the data source for a forecast of `pollutant` at `site`.
///
/// `site` defaults to the registry's default site.
#[must_use]
pub fn resolve_forecast(
    registry: &ModelRegistry,
    pollutant: Pollutant,
    site: Option<&str>,
) -> ForecastResolution {
    if !registry.models_enabled() {
        return ForecastResolution::LiveFallback;
    }

    if !registry.any_loaded() {
        return ForecastResolution::Unavailable(Unavailability::NoModelsLoaded);
    }

    let site = site.unwrap_or_else(|| registry.default_site());
    match registry.get(pollutant, site) {
        Some(model) => ForecastResolution::Model {
            site: site.to_string(),
            model,
        },
        None => ForecastResolution::Unavailable(Unavailability::ModelNotLoaded {
            pollutant,
            site: site.to_string(),
        }),
    }
}

/// Resolve whether hotspots can be served
#[must_use]
pub fn resolve_hotspots(registry: &ModelRegistry) -> HotspotResolution {
    if !registry.models_enabled() {
        HotspotResolution::LiveFallback
    } else if !registry.any_loaded() {
        HotspotResolution::Unavailable(Unavailability::NoModelsLoaded)
    } else if registry.fully_available() {
        HotspotResolution::ModelBacked
    } else {
        HotspotResolution::Unavailable(Unavailability::IncompleteModelSet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{BaselineTrendModel, ManifestEntry, ModelManifest};

    fn handle(pollutant: Pollutant) -> Arc<dyn ForecastModel> {
        Arc::new(BaselineTrendModel::new(pollutant))
    }

    #[test]
    fn disabled_models_fall_back() {
        let registry = ModelRegistry::disabled();
        assert!(matches!(
            resolve_forecast(&registry, Pollutant::No2, None),
            ForecastResolution::LiveFallback
        ));
        assert_eq!(resolve_hotspots(&registry), HotspotResolution::LiveFallback);
    }

    #[test]
    fn enabled_without_models_is_unavailable_everywhere() {
        let mut manifest = ModelManifest::default();
        manifest.models_enabled = true;
        manifest
            .no2_models
            .insert("site1".to_string(), ManifestEntry::Path("missing.pkl".into()));
        let registry = ModelRegistry::load(&manifest, &crate::ml::FileArtifactLoader);

        assert!(matches!(
            resolve_forecast(&registry, Pollutant::O3, None),
            ForecastResolution::Unavailable(Unavailability::NoModelsLoaded)
        ));
        assert_eq!(
            resolve_hotspots(&registry),
            HotspotResolution::Unavailable(Unavailability::NoModelsLoaded)
        );
    }

    #[test]
    fn loaded_model_is_served_for_default_site() {
        let registry = ModelRegistry::with_handles(
            "site1",
            [
                ("site1".to_string(), handle(Pollutant::No2)),
                ("site1".to_string(), handle(Pollutant::O3)),
            ],
        );

        match resolve_forecast(&registry, Pollutant::No2, None) {
            ForecastResolution::Model { site, model } => {
                assert_eq!(site, "site1");
                assert_eq!(model.pollutant(), Pollutant::No2);
            }
            other => panic!("expected model resolution, got {other:?}"),
        }
        assert_eq!(resolve_hotspots(&registry), HotspotResolution::ModelBacked);
    }

    #[test]
    fn missing_site_is_distinct_from_disabled() {
        let registry =
            ModelRegistry::with_handles("site1", [("site1".to_string(), handle(Pollutant::No2))]);

        match resolve_forecast(&registry, Pollutant::No2, Some("site9")) {
            ForecastResolution::Unavailable(Unavailability::ModelNotLoaded { pollutant, site }) => {
                assert_eq!(pollutant, Pollutant::No2);
                assert_eq!(site, "site9");
            }
            other => panic!("expected unavailable, got {other:?}"),
        }

        assert!(matches!(
            resolve_forecast(&registry, Pollutant::O3, None),
            ForecastResolution::Unavailable(Unavailability::ModelNotLoaded { .. })
        ));
        assert_eq!(
            resolve_hotspots(&registry),
            HotspotResolution::Unavailable(Unavailability::IncompleteModelSet)
        );
    }
}
