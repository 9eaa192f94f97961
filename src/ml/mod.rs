//! Forecasting models
//!
//! - Manifest: which artifacts exist per site and pollutant
//! - Model: the opaque inference seam and the artifact loader
//! - Registry: the read-only snapshot of what loaded at startup

pub mod manifest;
pub mod model;
pub mod registry;

pub use manifest::{ManifestEntry, ModelManifest};
pub use model::{
    ArtifactLoader, BaselineTrendModel, FileArtifactLoader, ForecastFeatures, ForecastModel,
    Prediction,
};
pub use registry::{ModelAvailability, ModelRegistry, ModelStatus};
