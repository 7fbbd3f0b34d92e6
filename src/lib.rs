//! # Holomed
//!
//! Heart-disease risk survey with explained predictions.
//!
//! This crate provides:
//! - Validation of the 22-question lifestyle and medical-history survey
//! - Risk scoring with a pre-trained balanced tree ensemble
//! - Per-feature explanations (TreeSHAP) and rule-based advice
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (survey answers, risk score, contributions, advice)
//! - `ports`: Trait definitions for the encoder and the classifier
//! - `adapters`: Concrete implementations (artifact loading, target encoder, tree ensemble)
//! - `application`: The assessment use case
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Assessment, RiskBand, SurveyAnswers};

/// Result type for Holomed operations
pub type Result<T> = std::result::Result<T, HolomedError>;

/// Main error type for Holomed
#[derive(Debug, thiserror::Error)]
pub enum HolomedError {
    #[error("Invalid survey answers: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Artifact loading failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Model evaluation failed: {0}")]
    Model(#[from] ports::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
