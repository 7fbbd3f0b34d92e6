//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the pre-trained artifacts (encoder, classifier).

mod classifier;
mod encoder;

pub use classifier::{FeatureAttribution, ModelError, RiskClassifier};
pub use encoder::{EncodedFeatures, FeatureEncoder};
