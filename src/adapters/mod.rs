//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: loading and digest checks for the model directory
//! - `encoding`: target encoder (`FeatureEncoder`)
//! - `gbdt`: boosted tree ensemble and TreeSHAP (`RiskClassifier`, `FeatureAttribution`)
//! - `sanitize`: PII filtering for logs

pub mod artifacts;
pub mod encoding;
pub mod gbdt;
pub mod sanitize;

pub use artifacts::{load_artifacts, ArtifactError, LoadedArtifacts};
