//! Classifier port: Traits for risk scoring and attribution.
//!
//! These traits abstract the pre-trained ensemble from the application logic.

use crate::domain::ContributionError;

use super::encoder::EncodedFeatures;

/// Errors that can occur while scoring or explaining a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("feature count mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("no survey answer for fitted feature `{0}`")]
    MissingFeature(String),

    #[error("feature order differs from training at column {index}: expected `{expected}`, got `{got}`")]
    FeatureOrder {
        index: usize,
        expected: String,
        got: String,
    },

    #[error("attributions cannot be normalized: {0}")]
    DegenerateAttribution(String),

    #[error("model produced a non-finite output")]
    NonFinite,
}

impl From<ContributionError> for ModelError {
    fn from(err: ContributionError) -> Self {
        match err {
            ContributionError::LengthMismatch { names, values } => Self::ShapeMismatch {
                expected: names,
                got: values,
            },
            ContributionError::Degenerate(_) => Self::DegenerateAttribution(err.to_string()),
        }
    }
}

/// Trait for probabilistic binary classifiers.
pub trait RiskClassifier: Send + Sync {
    /// Feature names, in the order the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Probability of the positive class, in [0, 1].
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row does not have the
    /// trained number of columns.
    fn predict_probability(&self, features: &EncodedFeatures) -> Result<f64, ModelError>;
}

/// Trait for models that can attribute a prediction to its input features.
///
/// Attributions are additive: they sum to the explained output minus the
/// model's expected output.
pub trait FeatureAttribution: Send + Sync {
    /// One signed attribution per feature, in column order.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the row does not have the
    /// trained number of columns.
    fn attributions(&self, features: &EncodedFeatures) -> Result<Vec<f64>, ModelError>;

    /// The model's expected output over its training distribution.
    fn expected_value(&self) -> f64;
}
